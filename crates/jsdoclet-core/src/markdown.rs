//! Markdown pages as doclets.
//!
//! A page opens with `!@key value` header lines, optionally closed by a
//! `---` line. Everything else is the page body.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::LazyLock;

use crate::doclet::{Code, Doclet, Kind, Meta};

static RE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^!@(\S*)\s*(.*)").unwrap());
static RE_LINE_BREAK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\r\n|\r|\n").unwrap());
static RE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#{1,6})\s+(.+?)\s*#*\s*$").unwrap());

/// Split a page into its header lines (trimmed) and body lines.
fn split_page(content: &str) -> (Vec<String>, Vec<&str>) {
    let mut header = Vec::new();
    let mut body = Vec::new();
    let mut recording = true;
    for line in RE_LINE_BREAK.split(content) {
        if recording && line.starts_with("---") {
            recording = false;
        } else if recording && line.starts_with("!@") {
            header.push(line.trim().to_string());
        } else {
            body.push(line);
        }
    }
    (header, body)
}

/// Headings of the body as `{level, text}`, skipping fenced code.
fn headings(body: &[&str]) -> Vec<Value> {
    let mut fenced = false;
    let mut found = Vec::new();
    for line in body {
        if line.trim_start().starts_with("```") {
            fenced = !fenced;
            continue;
        }
        if fenced {
            continue;
        }
        if let Some(caps) = RE_HEADING.captures(line) {
            found.push(json!({ "level": caps[1].len(), "text": &caps[2] }));
        }
    }
    found
}

/// Build the doclet for one page. Empty files produce none.
pub fn parse_page(content: &str, file: &str) -> Option<Doclet> {
    if content.is_empty() {
        return None;
    }
    let (header, body) = split_page(content);
    let mut doclet = Doclet {
        meta: Meta::new(file, 1, 0, None, Code::default()),
        ..Default::default()
    };

    for line in &header {
        let Some(caps) = RE_HEADER.captures(line) else {
            continue;
        };
        let (key, value) = (caps[1].to_string(), caps[2].to_string());
        match key.as_str() {
            "name" => doclet.name = Some(value),
            "longname" => doclet.longname = Some(value),
            "memberof" => doclet.memberof = Some(value),
            "description" => doclet.description = Some(value),
            "kind" => match Kind::parse(&value) {
                Some(kind) => doclet.kind = Some(kind),
                None => tracing::warn!(file, kind = %value, "unknown page kind"),
            },
            "scope" => {
                if let Err(err) = doclet.set_scope(&value) {
                    tracing::warn!(file, "{err}");
                }
            }
            _ => {
                doclet.extra.insert(key, Value::String(value));
            }
        }
    }
    if doclet.longname.is_none() {
        if let Some(name) = doclet.name.clone() {
            doclet.set_longname(&name);
        }
    }

    let toc = headings(&body);
    if !toc.is_empty() {
        doclet.extra.insert("toc".to_string(), Value::Array(toc));
    }
    doclet.markdown = Some(body.join("\n"));
    Some(doclet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::Scope;

    const PAGE: &str = "!@name Button\n!@kind component\n!@category forms\n---\n# Button\n\nClick it.\n\n```js\n# not a heading\n```\n## Props\n";

    #[test]
    fn header_lines_become_fields() {
        let doclet = parse_page(PAGE, "docs/button.md").unwrap();
        assert_eq!(doclet.name.as_deref(), Some("Button"));
        assert_eq!(doclet.longname.as_deref(), Some("Button"));
        assert_eq!(doclet.kind, Some(Kind::Component));
        assert_eq!(doclet.extra.get("category"), Some(&json!("forms")));
        assert_eq!(doclet.meta.filename, "button.md");
        assert_eq!(doclet.meta.path.as_deref(), Some("docs"));
    }

    #[test]
    fn body_is_kept_verbatim() {
        let doclet = parse_page(PAGE, "button.md").unwrap();
        let body = doclet.markdown.unwrap();
        assert!(body.starts_with("# Button\n\nClick it."));
        assert!(!body.contains("!@name"));
    }

    #[test]
    fn toc_skips_code_fences() {
        let doclet = parse_page(PAGE, "button.md").unwrap();
        assert_eq!(
            doclet.extra.get("toc"),
            Some(&json!([
                {"level": 1, "text": "Button"},
                {"level": 2, "text": "Props"}
            ]))
        );
    }

    #[test]
    fn header_without_separator_and_bad_scope() {
        let doclet = parse_page("!@name intro\n!@scope sideways\nHello\n", "intro.md").unwrap();
        assert_eq!(doclet.name.as_deref(), Some("intro"));
        assert_eq!(doclet.scope, None);
        assert_eq!(doclet.markdown.as_deref(), Some("Hello\n"));

        let doclet = parse_page("!@scope static\n", "x.md").unwrap();
        assert_eq!(doclet.scope, Some(Scope::Static));
    }

    #[test]
    fn empty_file_has_no_page() {
        assert!(parse_page("", "empty.md").is_none());
    }
}
