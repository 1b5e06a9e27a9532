//! Longname grammar: splitting, scope punctuation and name resolution.

use regex::Regex;
use std::sync::LazyLock;

use crate::doclet::{Doclet, Kind, Scope};

pub const GLOBAL: &str = "<global>";
pub const ANONYMOUS: &str = "<anonymous>";
pub const MODULE_NAMESPACE: &str = "module:";

pub const PUNC_INNER: char = '~';
pub const PUNC_INSTANCE: char = '#';
pub const PUNC_STATIC: char = '.';

static RE_PROTOTYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\.)prototype\.?").unwrap());

static RE_VARIATION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+)\(([^)]+)\)$").unwrap());

static RE_NAMESPACED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-zA-Z]+?:.+$").unwrap());

static RE_NAME_DESC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\[[^\]]+\]|\S+)(?:(?:[ \t]*-\s*|\s+)(\S[\s\S]*))?$").unwrap());

/// The pieces of a longname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NameParts {
    pub longname: String,
    pub memberof: String,
    /// Scope punctuation, empty for top-level names.
    pub scope: String,
    pub name: String,
    pub variation: Option<String>,
}

pub fn punc_to_scope(punc: char) -> Option<Scope> {
    match punc {
        PUNC_INNER => Some(Scope::Inner),
        PUNC_INSTANCE => Some(Scope::Instance),
        PUNC_STATIC => Some(Scope::Static),
        _ => None,
    }
}

pub fn scope_to_punc(scope: Scope) -> &'static str {
    match scope {
        Scope::Inner => "~",
        Scope::Instance => "#",
        Scope::Static => ".",
        Scope::Global => "",
    }
}

fn is_punc(c: char) -> bool {
    matches!(c, PUNC_INNER | PUNC_INSTANCE | PUNC_STATIC)
}

/// Rewrite `foo["bar"]` as `foo."bar"` so quoted members read like dotted
/// ones. Returns the rewritten text and, per char, whether it sits inside
/// quotes.
fn atomize(longname: &str) -> (Vec<char>, Vec<bool>) {
    let src: Vec<char> = longname.chars().collect();
    let mut out = Vec::with_capacity(src.len());
    let mut quoted = Vec::with_capacity(src.len());
    let mut i = 0;
    while i < src.len() {
        let c = src[i];
        let bracketed = c == '[' && matches!(src.get(i + 1), Some('"' | '\''));
        if bracketed || c == '"' || c == '\'' {
            let start = if bracketed { i + 1 } else { i };
            let quote = src[start];
            let Some(len) = src[start + 1..].iter().position(|&q| q == quote) else {
                out.push(c);
                quoted.push(false);
                i += 1;
                continue;
            };
            let end = start + 1 + len;
            if bracketed {
                out.push(PUNC_STATIC);
                quoted.push(false);
            }
            for &q in &src[start..=end] {
                out.push(q);
                quoted.push(true);
            }
            i = end + 1;
            if bracketed && src.get(i) == Some(&']') {
                i += 1;
            }
            continue;
        }
        out.push(c);
        quoted.push(false);
        i += 1;
    }
    (out, quoted)
}

/// Split a longname into memberof, scope punctuation, name and variation.
/// With `forced_memberof`, the owner is taken as given rather than parsed.
pub fn shorten(longname: &str, forced_memberof: Option<&str>) -> NameParts {
    let (chars, quoted) = atomize(longname);
    let text: String = chars.iter().collect();
    let mut parts = NameParts {
        longname: text.clone(),
        ..Default::default()
    };

    if let Some(forced) = forced_memberof {
        let rest: String = text.chars().skip(forced.chars().count()).collect();
        let (owner, punc) = match forced.chars().last() {
            Some(c) if is_punc(c) => (&forced[..forced.len() - c.len_utf8()], c.to_string()),
            _ => (forced, String::new()),
        };
        parts.memberof = owner.to_string();
        parts.scope = punc;
        parts.name = rest;
        if parts.scope.is_empty() {
            if let Some(first) = parts.name.chars().next().filter(|&c| is_punc(c)) {
                parts.scope = first.to_string();
                parts.name = parts.name[first.len_utf8()..].to_string();
            }
        }
    } else {
        // Last unquoted punctuation with at least one char on each side.
        let split = (1..chars.len().saturating_sub(1))
            .rev()
            .find(|&i| is_punc(chars[i]) && !quoted[i]);
        match split {
            Some(i) => {
                parts.memberof = chars[..i].iter().collect();
                parts.scope = chars[i].to_string();
                parts.name = chars[i + 1..].iter().collect();
            }
            None => parts.name = text,
        }
    }

    if let Some(caps) = RE_VARIATION.captures(&parts.name) {
        let (name, variation) = (caps[1].to_string(), caps[2].to_string());
        parts.name = name;
        parts.variation = Some(variation);
    }
    parts
}

/// Chunks of a longname from the outermost owner inwards, each carrying
/// its leading scope punctuation: `a.b#c` gives `["a", ".b", "#c"]`.
pub fn split_longname(longname: &str) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = longname.to_string();
    while !current.is_empty() {
        let parts = shorten(&current, None);
        let mut chunk = format!("{}{}", parts.scope, parts.name);
        if let Some(variation) = &parts.variation {
            chunk.push_str(&format!("({variation})"));
        }
        chunks.push(chunk);
        current = parts.memberof;
    }
    chunks.reverse();
    chunks
}

/// `Foo.prototype.bar` becomes `Foo#bar`. A symbol named `prototype` is
/// left alone.
pub fn prototype_to_punc(name: &str) -> String {
    if name == "prototype" {
        return name.to_string();
    }
    RE_PROTOTYPE.replace_all(name, "#").into_owned()
}

pub fn remove_global(longname: &str) -> String {
    longname
        .strip_prefix(GLOBAL)
        .map(|rest| rest.strip_prefix('.').unwrap_or(rest))
        .unwrap_or(longname)
        .to_string()
}

/// Decorate the last segment of a longname with a namespace, as in
/// `foo.bar` to `foo.event:bar`. Already namespaced names are kept.
pub fn apply_namespace(longname: &str, ns: &str) -> String {
    let parts = shorten(longname, None);
    if RE_NAMESPACED.is_match(&parts.name) {
        return parts.longname;
    }
    match parts.longname.rfind(parts.name.as_str()) {
        Some(at) if at + parts.name.len() == parts.longname.len() => {
            format!("{}{ns}:{}", &parts.longname[..at], parts.name)
        }
        _ => parts.longname,
    }
}

/// Split `name - description` (or `[name] description`) tag text. A hyphen
/// separator must sit on the same line as the name.
pub fn split_name(text: &str) -> (String, String) {
    if text.starts_with('[') {
        if let Some(end) = matching_bracket(text) {
            let name = text[..=end].to_string();
            let rest = text[end + 1..].trim_start_matches([' ', '\t']);
            let rest = rest.strip_prefix('-').unwrap_or(rest);
            return (name, rest.trim_start().to_string());
        }
    }
    match RE_NAME_DESC.captures(text) {
        Some(caps) => (
            caps[1].to_string(),
            caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        ),
        None => (String::new(), String::new()),
    }
}

/// Byte index of the `]` closing the bracket at index 0, honouring
/// nested brackets and quoted strings.
fn matching_bracket(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in text.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => match c {
                '"' | '\'' => quote = Some(c),
                '[' => depth += 1,
                ']' => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(i);
                    }
                }
                _ => {}
            },
        }
    }
    None
}

fn has_trailing_scope(memberof: &str) -> bool {
    memberof.chars().last().is_some_and(is_punc)
}

/// Whether `name` is `memberof` followed by scope punctuation.
fn name_is_longname(name: &str, memberof: &str) -> bool {
    name.strip_prefix(memberof)
        .and_then(|rest| rest.chars().next())
        .is_some_and(is_punc)
}

/// Settle `name`, `memberof`, `longname` and `scope` from whatever tags and
/// code metadata the doclet carries.
pub fn resolve(doclet: &mut Doclet) {
    let mut memberof = doclet.memberof.clone().unwrap_or_default();
    let mut name = doclet.name.clone().unwrap_or_default();

    if !name.is_empty() && doclet.kind != Some(Kind::Param) {
        name = prototype_to_punc(&name);
    }
    doclet.name = Some(name.clone());

    // A member of a variable from an outer function scope.
    if !name.is_empty() && memberof.is_empty() {
        if let Some(funcscope) = doclet.meta.code.funcscope.clone() {
            name = format!("{funcscope}{PUNC_INNER}{name}");
            doclet.longname = Some(name.clone());
        }
    }

    let forced = doclet.force_memberof;
    let mut about = NameParts::default();
    if !memberof.is_empty() || forced {
        memberof = prototype_to_punc(&memberof);
        let forced_owner = forced.then_some(memberof.as_str());
        if !name.is_empty() && name_is_longname(&name, &memberof) && name != memberof {
            about = shorten(&name, forced_owner);
        } else if !name.is_empty() && name == memberof && name.starts_with(MODULE_NAMESPACE) {
            about = shorten(&name, forced_owner);
        } else if !name.is_empty() && name == memberof {
            let scope = *doclet.scope.get_or_insert(Scope::Static);
            let full = format!("{memberof}{}{name}", scope_to_punc(scope));
            about = shorten(&full, forced_owner);
        } else if !name.is_empty() && has_trailing_scope(&memberof) {
            about = shorten(&format!("{memberof}{name}"), forced_owner);
        } else if !name.is_empty() {
            if let Some(scope) = doclet.scope {
                let full = format!("{memberof}{}{name}", scope_to_punc(scope));
                about = shorten(&full, forced_owner);
            }
        }
    } else {
        about = shorten(&name, None);
    }

    if !about.name.is_empty() {
        doclet.name = Some(about.name.clone());
    }
    if !about.memberof.is_empty() {
        doclet.set_memberof(&about.memberof);
    }
    if !about.longname.is_empty() && (doclet.longname.is_none() || doclet.longname == doclet.name) {
        doclet.set_longname(&about.longname);
    }

    if doclet.scope == Some(Scope::Global) {
        let name = doclet.name.clone().unwrap_or_default();
        doclet.set_longname(&name);
        doclet.memberof = None;
    } else if let Some(punc) = about.scope.chars().next() {
        doclet.scope = if about.memberof == GLOBAL {
            Some(Scope::Global)
        } else {
            punc_to_scope(punc)
        };
    } else if let (Some(name), Some(owner)) = (doclet.name.clone(), doclet.memberof.clone()) {
        if doclet.longname.is_none() && !name.is_empty() {
            let mut name = name;
            let leading = name.chars().next().filter(|&c| is_punc(c));
            if let Some(punc) = leading {
                doclet.scope = punc_to_scope(punc);
                name = name[punc.len_utf8()..].to_string();
                doclet.name = Some(name.clone());
            } else {
                // An instance member of a class that is itself a static
                // member of something else only shows in the code name.
                let code_name = doclet.meta.code.name.clone().unwrap_or_default();
                let punc_and_name = format!("{PUNC_INSTANCE}{name}");
                doclet.scope = if !code_name.is_empty() && code_name.ends_with(&punc_and_name) {
                    Some(Scope::Instance)
                } else {
                    Some(Scope::Static)
                };
            }
            let scope = doclet.scope.unwrap_or(Scope::Static);
            doclet.set_longname(&format!("{owner}{}{name}", scope_to_punc(scope)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shorten_splits_at_last_punctuation() {
        let parts = shorten("a.b#c~d", None);
        assert_eq!(parts.memberof, "a.b#c");
        assert_eq!(parts.scope, "~");
        assert_eq!(parts.name, "d");
    }

    #[test]
    fn shorten_keeps_quoted_segments_whole() {
        let parts = shorten("chat.\"#channel\"", None);
        assert_eq!(parts.memberof, "chat");
        assert_eq!(parts.name, "\"#channel\"");

        let parts = shorten("foo[\"bar.baz\"]", None);
        assert_eq!(parts.memberof, "foo");
        assert_eq!(parts.scope, ".");
        assert_eq!(parts.name, "\"bar.baz\"");
    }

    #[test]
    fn shorten_extracts_variation() {
        let parts = shorten("Foo#bar(2)", None);
        assert_eq!(parts.name, "bar");
        assert_eq!(parts.variation.as_deref(), Some("2"));
    }

    #[test]
    fn shorten_with_forced_owner() {
        let parts = shorten("Foo.bar", Some("Foo"));
        assert_eq!(parts.memberof, "Foo");
        assert_eq!(parts.scope, ".");
        assert_eq!(parts.name, "bar");
    }

    #[test]
    fn top_level_name_has_no_owner() {
        let parts = shorten("foo", None);
        assert_eq!(parts.memberof, "");
        assert_eq!(parts.scope, "");
        assert_eq!(parts.name, "foo");
    }

    #[test]
    fn prototype_becomes_instance_punctuation() {
        assert_eq!(prototype_to_punc("Foo.prototype.bar"), "Foo#bar");
        assert_eq!(prototype_to_punc("Foo.prototype"), "Foo#");
        assert_eq!(prototype_to_punc("prototype"), "prototype");
    }

    #[test]
    fn namespace_decorates_last_segment() {
        assert_eq!(apply_namespace("foo", "module"), "module:foo");
        assert_eq!(apply_namespace("Foo.change", "event"), "Foo.event:change");
        assert_eq!(apply_namespace("module:foo", "module"), "module:foo");
    }

    #[test]
    fn split_name_forms() {
        assert_eq!(split_name("foo The foo."), ("foo".into(), "The foo.".into()));
        assert_eq!(split_name("foo - The foo."), ("foo".into(), "The foo.".into()));
        assert_eq!(split_name("[foo=1] opt"), ("[foo=1]".into(), "opt".into()));
        assert_eq!(split_name("[a=[1, 2]] - list"), ("[a=[1, 2]]".into(), "list".into()));
        assert_eq!(split_name("foo"), ("foo".into(), String::new()));
    }

    #[test]
    fn split_longname_chunks() {
        assert_eq!(split_longname("a.b#c"), vec!["a", ".b", "#c"]);
        assert_eq!(split_longname("module:foo~bar"), vec!["module:foo", "~bar"]);
    }

    #[test]
    fn remove_global_prefix() {
        assert_eq!(remove_global("<global>.foo"), "foo");
        assert_eq!(remove_global("foo"), "foo");
    }
}
