use std::collections::HashMap;

use crate::doclet::{Doclet, Kind};

/// Fold doclets sharing a kind and a name into one. Later doclets overwrite
/// the fields they set on the earlier ones; list fields are replaced, not
/// concatenated. Groups keep the position of their first member.
pub fn merge_doclets(doclets: Vec<Doclet>) -> Vec<Doclet> {
    let mut slots: HashMap<(Option<Kind>, String), usize> = HashMap::new();
    let mut merged: Vec<Doclet> = Vec::with_capacity(doclets.len());

    for doclet in doclets {
        let key = (doclet.kind, doclet.name().to_string());
        match slots.get(&key) {
            Some(&at) => merged[at].merge_from(doclet),
            None => {
                slots.insert(key, merged.len());
                merged.push(doclet);
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::Param;

    fn named(name: &str, kind: Option<Kind>) -> Doclet {
        Doclet {
            name: Some(name.into()),
            longname: Some(name.into()),
            kind,
            ..Default::default()
        }
    }

    fn param(name: &str) -> Param {
        Param {
            name: Some(name.into()),
            ..Default::default()
        }
    }

    #[test]
    fn later_fields_overwrite_earlier() {
        let mut page = named("Button", Some(Kind::Component));
        page.markdown = Some("# Button".into());
        page.description = Some("From the page.".into());
        page.params = vec![param("a"), param("b")];

        let mut code = named("Button", Some(Kind::Component));
        code.description = Some("From the code.".into());
        code.params = vec![param("c")];

        let merged = merge_doclets(vec![page, code]);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].description.as_deref(), Some("From the code."));
        assert_eq!(merged[0].markdown.as_deref(), Some("# Button"));
        assert_eq!(merged[0].params, vec![param("c")]);
    }

    #[test]
    fn kind_is_part_of_the_key() {
        let merged = merge_doclets(vec![
            named("x", Some(Kind::Member)),
            named("y", None),
            named("x", Some(Kind::Function)),
            named("y", None),
        ]);
        let keys: Vec<(Option<Kind>, &str)> = merged.iter().map(|d| (d.kind, d.name())).collect();
        assert_eq!(
            keys,
            vec![(Some(Kind::Member), "x"), (None, "y"), (Some(Kind::Function), "x")]
        );
    }

    #[test]
    fn flags_only_switch_on() {
        let mut first = named("f", Some(Kind::Function));
        first.undocumented = true;
        let merged = merge_doclets(vec![first, named("f", Some(Kind::Function))]);
        assert!(merged[0].undocumented);
    }
}
