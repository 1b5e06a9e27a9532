//! Structured tag values: `{type} [name=default] description`.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

use crate::error::{Error, Result};
use crate::name;
use crate::types::{self, TypeGrammar};

static RE_OPTIONAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[\s*(.+?)\s*\]$").unwrap());
static RE_DEFAULT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(.+?)\s*=\s*(.+)$").unwrap());
static RE_TYPE_START: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{[^@]").unwrap());

#[derive(Debug, Clone, Default, PartialEq)]
pub struct TagInfo {
    pub type_expression: String,
    pub types: Vec<String>,
    pub name: String,
    pub text: String,
    pub optional: Option<bool>,
    pub nullable: Option<bool>,
    pub variable: Option<bool>,
    pub defaultvalue: Option<Value>,
}

/// Pull the first balanced `{...}` out of `text`. Returns the expression
/// and the remaining text, both trimmed. A backslash escapes the next char.
pub fn extract_type_expression(text: &str) -> (String, String) {
    let Some(start) = RE_TYPE_START.find(text).map(|m| m.start()) else {
        return (String::new(), text.trim().to_string());
    };
    let bytes = text.as_bytes();
    let mut depth = 1usize;
    let mut pos = start + 1;
    while pos < bytes.len() {
        match bytes[pos] {
            b'\\' => pos += 1,
            b'{' => depth += 1,
            b'}' => depth -= 1,
            _ => {}
        }
        if depth == 0 {
            let expression = text[start + 1..pos].trim().replace("\\{", "{").replace("\\}", "}");
            let rest = format!("{}{}", &text[..start], &text[pos + 1..]);
            return (expression, rest.trim().to_string());
        }
        pos += 1;
    }
    // Unbalanced braces: nothing is extracted.
    (String::new(), text.trim().to_string())
}

/// Split tag text into its type expression, name and description, and
/// read optionality and defaults off a bracketed name.
pub fn tag_info(text: &str, can_have_name: bool, can_have_type: bool) -> TagInfo {
    let mut info = TagInfo::default();
    let mut rest = text.to_string();
    if can_have_type {
        let (expression, remaining) = extract_type_expression(&rest);
        info.type_expression = expression;
        rest = remaining;
    }
    if can_have_name {
        let (name, description) = name::split_name(&rest);
        info.name = name;
        info.text = description;
    } else {
        info.text = rest;
    }

    if let Some(caps) = RE_OPTIONAL.captures(&info.name) {
        let inner = caps[1].to_string();
        info.optional = Some(true);
        match RE_DEFAULT.captures(&inner) {
            Some(d) => {
                info.defaultvalue = cast(&d[2]);
                info.name = d[1].to_string();
            }
            None => info.name = inner,
        }
    }
    info
}

/// Parse the type expression and flatten it into `types`, copying the
/// expression's modifiers. An empty expression is left alone.
pub fn parse_type_expression(info: &mut TagInfo, grammar: &dyn TypeGrammar) -> Result<()> {
    if info.type_expression.is_empty() {
        return Ok(());
    }
    let node = grammar
        .parse(&info.type_expression)
        .map_err(|err| Error::InvalidType {
            expression: info.type_expression.clone(),
            message: err.to_string(),
        })?;

    info.types.extend(types::flatten(grammar, &node));
    if info.types.is_empty() {
        info.types.push(info.type_expression.clone());
    }
    if node.optional.is_some() {
        info.optional = node.optional;
    }
    if node.nullable.is_some() {
        info.nullable = node.nullable;
    }
    if node.repeatable.is_some() {
        info.variable = node.repeatable;
    }
    Ok(())
}

/// Turn literal-looking text into a JSON value. `undefined` has no value;
/// `NaN` stays a string since JSON cannot hold it.
pub fn cast(text: &str) -> Option<Value> {
    match text {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        "null" => return Some(Value::Null),
        "undefined" => return None,
        "NaN" => return Some(Value::String(text.to_string())),
        _ => {}
    }
    if text.contains('.') {
        if let Ok(n) = text.parse::<f64>() {
            if n.is_finite() && n.to_string() == text {
                if let Some(num) = serde_json::Number::from_f64(n) {
                    return Some(Value::Number(num));
                }
            }
        }
    } else if let Ok(n) = text.parse::<i64>() {
        if n.to_string() == text {
            return Some(Value::from(n));
        }
    }
    Some(Value::String(text.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Permissive;
    use serde_json::json;

    #[test]
    fn extracts_nested_braces() {
        let (expr, rest) = extract_type_expression("{{a: number}} obj - thing");
        assert_eq!(expr, "{a: number}");
        assert_eq!(rest, "obj - thing");
    }

    #[test]
    fn inline_links_are_not_types() {
        let (expr, rest) = extract_type_expression("see {@link Foo}");
        assert_eq!(expr, "");
        assert_eq!(rest, "see {@link Foo}");
    }

    #[test]
    fn escaped_braces_unescape() {
        let (expr, _) = extract_type_expression(r"{Object.<string, \{a\}>} x");
        assert_eq!(expr, "Object.<string, {a}>");
    }

    #[test]
    fn unbalanced_braces_extract_nothing() {
        let (expr, rest) = extract_type_expression("{string x");
        assert_eq!(expr, "");
        assert_eq!(rest, "{string x");
    }

    #[test]
    fn bracketed_name_is_optional_with_default() {
        let info = tag_info("{number} [count = 3] how many", true, true);
        assert_eq!(info.name, "count");
        assert_eq!(info.optional, Some(true));
        assert_eq!(info.defaultvalue, Some(json!(3)));
        assert_eq!(info.text, "how many");
    }

    #[test]
    fn modifiers_copied_from_type() {
        let mut info = tag_info("{...?string} rest", true, true);
        parse_type_expression(&mut info, &Permissive).unwrap();
        assert_eq!(info.types, vec!["string"]);
        assert_eq!(info.variable, Some(true));
        assert_eq!(info.nullable, Some(true));
    }

    #[test]
    fn bad_type_reports_expression() {
        let mut info = tag_info("{Array.<} x", true, true);
        let err = parse_type_expression(&mut info, &Permissive).unwrap_err();
        assert!(err.to_string().starts_with("Invalid type expression \"Array.<\""));
        assert!(info.types.is_empty());
    }

    #[test]
    fn cast_literals() {
        assert_eq!(cast("true"), Some(json!(true)));
        assert_eq!(cast("null"), Some(Value::Null));
        assert_eq!(cast("undefined"), None);
        assert_eq!(cast("42"), Some(json!(42)));
        assert_eq!(cast("1.5"), Some(json!(1.5)));
        assert_eq!(cast("1.0"), Some(json!("1.0")));
        assert_eq!(cast("007"), Some(json!("007")));
        assert_eq!(cast("NaN"), Some(json!("NaN")));
        assert_eq!(cast("hello"), Some(json!("hello")));
    }
}
