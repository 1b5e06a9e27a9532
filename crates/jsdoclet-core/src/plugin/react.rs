//! React components: fold `propTypes` and `defaultProps` into `props`.

use regex::Regex;
use std::sync::LazyLock;

use crate::descriptor::js_string;
use crate::doclet::{ComponentProp, Doclet, Kind};

static RE_PROP_TYPES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(React\.)?PropTypes\.").unwrap());
static RE_IS_REQUIRED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\.isRequired").unwrap());

fn prop_type(value: &str) -> String {
    let value = RE_PROP_TYPES.replace(value, "");
    RE_IS_REQUIRED.replace(&value, "").into_owned()
}

fn code_value(doclet: &Doclet) -> String {
    doclet.meta.code.value.as_ref().map(js_string).unwrap_or_default()
}

/// Remove the `holder` doclet and the members of the object it holds.
/// An identifier holder points at the object by name.
fn take_members(doclets: &[Doclet], removed: &mut [bool], holder: &str) -> Vec<usize> {
    let Some(first) =
        (0..doclets.len()).find(|&i| !removed[i] && doclets[i].longname() == holder)
    else {
        return Vec::new();
    };
    for (i, d) in doclets.iter().enumerate() {
        if d.longname() == holder {
            removed[i] = true;
        }
    }
    let owner = match doclets[first].meta.code.node_type.as_deref() {
        Some("Identifier") => code_value(&doclets[first]),
        Some("ObjectExpression") => holder.to_string(),
        _ => return Vec::new(),
    };
    let members: Vec<usize> = (0..doclets.len())
        .filter(|&i| !removed[i] && doclets[i].memberof.as_deref() == Some(owner.as_str()))
        .collect();
    for &i in &members {
        removed[i] = true;
    }
    members
}

fn prop_mut<'a>(props: &'a mut Vec<ComponentProp>, name: &str) -> &'a mut ComponentProp {
    let at = match props.iter().position(|p| p.name == name) {
        Some(at) => at,
        None => {
            props.push(ComponentProp {
                name: name.to_string(),
                ..Default::default()
            });
            props.len() - 1
        }
    };
    &mut props[at]
}

/// Fold prop declarations into each component doclet of one file. The
/// folded doclets are removed; components keep their position.
pub fn fold_component_props(doclets: &mut Vec<Doclet>) {
    let components: Vec<usize> = (0..doclets.len())
        .filter(|&i| doclets[i].kind == Some(Kind::Component))
        .collect();
    if components.is_empty() {
        return;
    }
    let mut removed = vec![false; doclets.len()];

    for ci in components {
        let longname = doclets[ci].longname().to_string();
        let types: Vec<(String, Option<String>, String, String)> =
            take_members(doclets, &mut removed, &format!("{longname}.propTypes"))
                .into_iter()
                .map(|i| {
                    let d = &doclets[i];
                    let declared = d.ty.as_ref().map(|names| names.join(" / "));
                    (
                        d.name().to_string(),
                        declared,
                        code_value(d),
                        d.description.clone().unwrap_or_default(),
                    )
                })
                .collect();
        let defaults: Vec<(String, Option<serde_json::Value>)> =
            take_members(doclets, &mut removed, &format!("{longname}.defaultProps"))
                .into_iter()
                .map(|i| (doclets[i].name().to_string(), doclets[i].meta.code.value.clone()))
                .collect();

        let props = &mut doclets[ci].props;
        for (name, declared, value, description) in types {
            let prop = prop_mut(props, &name);
            prop.ty = Some(declared.unwrap_or_else(|| prop_type(&value)));
            prop.required = value.ends_with(".isRequired");
            prop.description = Some(description);
        }
        for (name, value) in defaults {
            prop_mut(props, &name).default_value = value;
        }
    }

    let mut keep = removed.into_iter().map(|r| !r);
    doclets.retain(|_| keep.next().unwrap_or(true));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::{Code, Meta};
    use serde_json::json;

    fn doclet(
        longname: &str,
        memberof: Option<&str>,
        node_type: &str,
        value: serde_json::Value,
    ) -> Doclet {
        let code = Code {
            node_type: Some(node_type.into()),
            value: Some(value),
            ..Default::default()
        };
        Doclet {
            name: Some(longname.rsplit('.').next().unwrap_or(longname).to_string()),
            longname: Some(longname.into()),
            memberof: memberof.map(str::to_string),
            kind: Some(Kind::Member),
            meta: Meta::new("button.jsx", 1, 0, None, code),
            ..Default::default()
        }
    }

    #[test]
    fn prop_type_strips_namespace_and_required() {
        assert_eq!(prop_type("PropTypes.string.isRequired"), "string");
        assert_eq!(prop_type("React.PropTypes.func"), "func");
    }

    #[test]
    fn folds_prop_types_and_defaults() {
        let mut component = doclet("Button", None, "ClassDeclaration", json!(""));
        component.kind = Some(Kind::Component);
        let mut label = doclet(
            "Button.propTypes.label",
            Some("Button.propTypes"),
            "MemberExpression",
            json!("PropTypes.string.isRequired"),
        );
        label.description = Some("Text on the button.".into());
        let mut doclets = vec![
            component,
            doclet("Button.propTypes", Some("Button"), "ObjectExpression", json!("{}")),
            label,
            doclet("Button.defaultProps", Some("Button"), "Identifier", json!("defaults")),
            doclet("defaults.size", Some("defaults"), "Literal", json!("small")),
            doclet("other", None, "Literal", json!(1)),
        ];
        fold_component_props(&mut doclets);

        assert_eq!(doclets.len(), 2);
        assert_eq!(doclets[0].longname(), "Button");
        assert_eq!(doclets[1].longname(), "other");
        let props = &doclets[0].props;
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].name, "label");
        assert_eq!(props[0].ty.as_deref(), Some("string"));
        assert!(props[0].required);
        assert_eq!(props[0].description.as_deref(), Some("Text on the button."));
        assert_eq!(props[1].name, "size");
        assert_eq!(props[1].default_value, Some(json!("small")));
    }

    #[test]
    fn documented_type_wins() {
        let mut component = doclet("Card", None, "ClassDeclaration", json!(""));
        component.kind = Some(Kind::Component);
        let mut title = doclet(
            "Card.propTypes.title",
            Some("Card.propTypes"),
            "MemberExpression",
            json!("PropTypes.node"),
        );
        title.ty = Some(vec!["string".into(), "Element".into()]);
        let mut doclets = vec![
            component,
            doclet("Card.propTypes", Some("Card"), "ObjectExpression", json!("{}")),
            title,
        ];
        fold_component_props(&mut doclets);
        assert_eq!(doclets[0].props[0].ty.as_deref(), Some("string / Element"));
        assert!(!doclets[0].props[0].required);
    }
}
