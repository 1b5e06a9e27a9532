//! One `@title text` unit of a doc comment.

pub mod dictionary;
pub mod validator;
pub mod value;

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::context::UnknownTags;
use crate::doclet::{Meta, Param};
use crate::types::Permissive;
use dictionary::TagDef;

static RE_LEADING_INDENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([ \t]+)").unwrap());

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TagValue {
    Text(String),
    Parsed(Param),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub original_title: String,
    /// Canonical title after synonym lookup.
    pub title: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<TagValue>,
}

/// Trim tag text. Whitespace-preserving tags only lose surrounding line
/// breaks and, when asked, the first line's indent on every line.
pub fn trim(text: &str, keeps_whitespace: bool, removes_indent: bool) -> String {
    if !keeps_whitespace {
        return text.trim().to_string();
    }
    let text = text.trim_matches(['\n', '\r', '\u{c}']);
    if removes_indent {
        if let Some(indent) = RE_LEADING_INDENT.captures(text).map(|c| c[1].to_string()) {
            return text
                .split('\n')
                .map(|line| line.strip_prefix(indent.as_str()).unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\n");
        }
    }
    text.to_string()
}

impl Tag {
    pub fn new(title: &str, text: Option<&str>, meta: &Meta, unknown_tags: &UnknownTags) -> Tag {
        let original_title = title.trim().to_string();
        let title = dictionary::normalise(&original_title);
        let def = dictionary::lookup(&title);
        let (keeps_whitespace, removes_indent) = def
            .map(|d| (d.keeps_whitespace, d.removes_indent))
            .unwrap_or((false, false));

        let mut tag = Tag {
            original_title,
            title,
            text: trim(text.unwrap_or(""), keeps_whitespace, removes_indent),
            value: None,
        };
        if !tag.text.is_empty() {
            tag.process_text(def, meta);
        }
        validator::validate(&tag, def, meta, unknown_tags);
        tag
    }

    fn process_text(&mut self, def: Option<&TagDef>, meta: &Meta) {
        let Some(def) = def else {
            self.value = Some(TagValue::Text(self.text.clone()));
            return;
        };
        if let Some(on_tag_text) = def.on_tag_text {
            self.text = on_tag_text(&self.text);
        }
        if !(def.can_have_type || def.can_have_name) {
            self.value = Some(TagValue::Text(self.text.clone()));
            return;
        }

        let mut info = value::tag_info(&self.text, def.can_have_name, def.can_have_type);
        if let Err(err) = value::parse_type_expression(&mut info, &Permissive) {
            tracing::error!(file = %meta.filepath(), line = meta.lineno, "{err}");
        }
        let mut param = Param {
            optional: info.optional,
            nullable: info.nullable,
            variable: info.variable,
            defaultvalue: info.defaultvalue,
            ..Default::default()
        };
        if !info.types.is_empty() {
            param.ty = Some(info.types);
        }
        if !info.text.is_empty() {
            param.description = Some(info.text);
        }
        // A lone dash as a name means "no name".
        if def.can_have_name && !info.name.is_empty() && info.name != "-" {
            param.name = Some(info.name);
        }
        self.value = Some(TagValue::Parsed(param));
    }

    /// The value as plain text, if the tag has no structure.
    pub fn value_text(&self) -> Option<&str> {
        match &self.value {
            Some(TagValue::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn parsed(&self) -> Option<&Param> {
        match &self.value {
            Some(TagValue::Parsed(p)) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::Code;

    fn tag(title: &str, text: &str) -> Tag {
        let meta = Meta::new("a.js", 1, 0, None, Code::default());
        Tag::new(title, Some(text), &meta, &UnknownTags::Flag(true))
    }

    #[test]
    fn synonyms_normalise() {
        let t = tag("arg", "{string} x");
        assert_eq!(t.original_title, "arg");
        assert_eq!(t.title, "param");
    }

    #[test]
    fn param_value_is_parsed() {
        let t = tag("param", "{string=} [name=hi] - the name");
        let p = t.parsed().unwrap();
        assert_eq!(p.name.as_deref(), Some("name"));
        assert_eq!(p.ty.as_deref(), Some(&["string".to_string()][..]));
        assert_eq!(p.optional, Some(true));
        assert_eq!(p.defaultvalue, Some(serde_json::json!("hi")));
        assert_eq!(p.description.as_deref(), Some("the name"));
    }

    #[test]
    fn plain_tags_keep_text() {
        let t = tag("since", "  1.2.0 \n");
        assert_eq!(t.value_text(), Some("1.2.0"));
    }

    #[test]
    fn example_keeps_relative_indent() {
        let t = tag("example", "\n    foo();\n      bar();\n");
        assert_eq!(t.value_text(), Some("foo();\n  bar();"));
    }

    #[test]
    fn invalid_type_leaves_type_empty() {
        let t = tag("param", "{Array.<} x");
        let p = t.parsed().unwrap();
        assert_eq!(p.ty, None);
        assert_eq!(p.name.as_deref(), Some("x"));
    }

    #[test]
    fn unknown_tags_keep_raw_text() {
        let t = tag("frob", "a {b} c");
        assert_eq!(t.value, Some(TagValue::Text("a {b} c".into())));
    }

    #[test]
    fn dash_is_not_a_name() {
        let t = tag("returns", "{number} - count");
        let p = t.parsed().unwrap();
        assert_eq!(p.name, None);
        assert_eq!(p.description.as_deref(), Some("- count"));
    }
}
