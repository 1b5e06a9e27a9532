//! Tag sanity checks. Problems are logged, never fatal.

use crate::context::UnknownTags;
use crate::doclet::Meta;
use crate::tag::dictionary::TagDef;
use crate::tag::Tag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub severity: Severity,
    pub message: String,
}

fn issue(severity: Severity, tag: &Tag, meta: &Meta, what: &str) -> Issue {
    Issue {
        severity,
        message: format!(
            "The @{} tag {what}. File: {}, line: {}",
            tag.title,
            meta.filename,
            meta.lineno
        ),
    }
}

/// Check `tag` against its definition and log what is wrong with it.
pub fn validate(
    tag: &Tag,
    def: Option<&TagDef>,
    meta: &Meta,
    unknown_tags: &UnknownTags,
) -> Option<Issue> {
    let found = check(tag, def, meta, unknown_tags)?;
    match found.severity {
        Severity::Error => tracing::error!("{}", found.message),
        Severity::Warning => tracing::warn!("{}", found.message),
    }
    Some(found)
}

fn check(
    tag: &Tag,
    def: Option<&TagDef>,
    meta: &Meta,
    unknown_tags: &UnknownTags,
) -> Option<Issue> {
    let Some(def) = def else {
        return (!unknown_tags.tolerates(&tag.title))
            .then(|| issue(Severity::Error, tag, meta, "is not a known tag"));
    };
    let has_description = tag
        .parsed()
        .is_some_and(|p| p.description.as_deref().is_some_and(|d| !d.is_empty()));

    if tag.text.is_empty() && def.must_have_value {
        Some(issue(Severity::Error, tag, meta, "requires a value"))
    } else if !tag.text.is_empty() && def.must_not_have_value {
        Some(issue(
            Severity::Warning,
            tag,
            meta,
            "does not permit a value; the value will be ignored",
        ))
    } else if has_description && def.must_not_have_description {
        Some(issue(
            Severity::Warning,
            tag,
            meta,
            "does not permit a description; the description will be ignored",
        ))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::Code;
    use crate::tag::dictionary;

    fn meta() -> Meta {
        Meta::new("src/a.js", 7, 0, None, Code::default())
    }

    fn run(title: &str, text: &str, unknown: &UnknownTags) -> Option<Issue> {
        let tag = Tag::new(title, Some(text), &meta(), unknown);
        validate(&tag, dictionary::lookup(&tag.title), &meta(), unknown)
    }

    #[test]
    fn unknown_tag_only_reported_when_strict() {
        assert_eq!(run("frob", "x", &UnknownTags::Flag(true)), None);
        let found = run("frob", "x", &UnknownTags::Flag(false)).unwrap();
        assert_eq!(found.severity, Severity::Error);
        assert_eq!(found.message, "The @frob tag is not a known tag. File: a.js, line: 7");
    }

    #[test]
    fn tolerated_list() {
        let unknown = UnknownTags::List(vec!["frob".into()]);
        assert_eq!(run("frob", "x", &unknown), None);
        assert!(run("other", "x", &unknown).is_some());
    }

    #[test]
    fn missing_value() {
        let found = run("since", "", &UnknownTags::Flag(true)).unwrap();
        assert_eq!(found.severity, Severity::Error);
        assert!(found.message.contains("requires a value"));
    }

    #[test]
    fn ignored_value_and_description() {
        let found = run("ignore", "please", &UnknownTags::Flag(true)).unwrap();
        assert_eq!(found.severity, Severity::Warning);

        let found = run("type", "{string} words", &UnknownTags::Flag(true)).unwrap();
        assert!(found.message.contains("does not permit a description"));
    }

    #[test]
    fn clean_tag_passes() {
        assert_eq!(run("param", "{string} x", &UnknownTags::Flag(true)), None);
    }
}
