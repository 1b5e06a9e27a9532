//! Navigation views over a processed collection.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::doclet::{Doclet, Kind};
use crate::name::{self, MODULE_NAMESPACE, PUNC_INSTANCE};

// -- Categories ---------------------------------------------------------------

#[derive(Debug, Default, Serialize)]
pub struct Members<'a> {
    pub classes: Vec<&'a Doclet>,
    pub components: Vec<&'a Doclet>,
    pub events: Vec<&'a Doclet>,
    pub globals: Vec<&'a Doclet>,
    pub mixins: Vec<&'a Doclet>,
    pub modules: Vec<&'a Doclet>,
    pub namespaces: Vec<&'a Doclet>,
    pub interfaces: Vec<&'a Doclet>,
}

/// A module that is itself the export, as in `module.exports = function`.
fn is_module_exports(doclet: &Doclet) -> bool {
    let longname = doclet.longname();
    !longname.is_empty()
        && Some(longname) == doclet.name.as_deref()
        && longname.starts_with(MODULE_NAMESPACE)
        && doclet.kind != Some(Kind::Module)
}

/// Group doclets by category. Globals are unowned members, functions,
/// constants and typedefs, except those that are module exports.
pub fn categorize(doclets: &[Doclet]) -> Members<'_> {
    let mut members = Members::default();
    for doclet in doclets {
        let Some(kind) = doclet.kind else {
            continue;
        };
        let group = match kind {
            Kind::Class => &mut members.classes,
            Kind::Component => &mut members.components,
            Kind::Event => &mut members.events,
            Kind::Mixin => &mut members.mixins,
            Kind::Module => &mut members.modules,
            Kind::Namespace => &mut members.namespaces,
            Kind::Interface => &mut members.interfaces,
            Kind::Member | Kind::Function | Kind::Constant | Kind::Typedef
                if doclet.memberof.is_none() && !is_module_exports(doclet) =>
            {
                &mut members.globals
            }
            _ => continue,
        };
        group.push(doclet);
    }
    members
}

// -- Longname tree ------------------------------------------------------------

/// One longname segment. Children are keyed by their segment with its
/// leading punctuation; instance members sit under `prototype`, keyed
/// `.name`.
#[derive(Debug, Default, Serialize)]
pub struct TreeNode<'a> {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub longname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doclet: Option<&'a Doclet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<Kind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prototype: Option<BTreeMap<String, TreeNode<'a>>>,
    #[serde(flatten)]
    pub children: BTreeMap<String, TreeNode<'a>>,
}

impl<'a> TreeNode<'a> {
    /// Follow child keys from this node.
    pub fn get(&self, path: &[&str]) -> Option<&TreeNode<'a>> {
        let mut node = self;
        for key in path {
            node = match key.strip_prefix(PUNC_INSTANCE) {
                Some(member) => node.prototype.as_ref()?.get(&format!(".{member}"))?,
                None => node.children.get(*key)?,
            };
        }
        Some(node)
    }
}

/// Module longnames root under `module` (keyed `/name`), everything else
/// under `global`.
#[derive(Debug, Default, Serialize)]
pub struct DocletTree<'a> {
    pub module: TreeNode<'a>,
    pub global: TreeNode<'a>,
}

pub fn tree(doclets: &[Doclet]) -> DocletTree<'_> {
    let mut tree = DocletTree::default();
    for doclet in doclets {
        let chunks = name::split_longname(doclet.longname());
        let Some(first) = chunks.first() else {
            continue;
        };
        let mut node = if first.starts_with(MODULE_NAMESPACE) {
            &mut tree.module
        } else {
            &mut tree.global
        };

        let mut current = String::new();
        let last = chunks.len() - 1;
        for (i, chunk) in chunks.iter().enumerate() {
            current.push_str(chunk);
            let (map, key) = match chunk.strip_prefix(PUNC_INSTANCE) {
                Some(member) if i > 0 => (
                    node.prototype.get_or_insert_with(BTreeMap::new),
                    format!(".{member}"),
                ),
                _ => {
                    let key = match chunk.strip_prefix(MODULE_NAMESPACE) {
                        Some(module) if i == 0 => format!("/{module}"),
                        _ => chunk.clone(),
                    };
                    (&mut node.children, key)
                }
            };
            node = map.entry(key).or_insert_with(|| TreeNode {
                longname: current.clone(),
                ..Default::default()
            });
            if i == last {
                node.doclet = Some(doclet);
                node.kind = doclet.kind;
            }
        }
    }
    tree
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doclet(longname: &str, kind: Kind, memberof: Option<&str>) -> Doclet {
        Doclet {
            name: Some(name::shorten(longname, None).name),
            longname: Some(longname.into()),
            kind: Some(kind),
            memberof: memberof.map(str::to_string),
            ..Default::default()
        }
    }

    fn longnames(group: &[&Doclet]) -> Vec<String> {
        group.iter().map(|d| d.longname().to_string()).collect()
    }

    #[test]
    fn categories() {
        let mut exported = doclet("module:greet", Kind::Function, None);
        exported.name = Some("module:greet".into());
        let doclets = vec![
            doclet("Foo", Kind::Class, None),
            doclet("Foo#run", Kind::Function, Some("Foo")),
            doclet("helper", Kind::Function, None),
            doclet("LIMIT", Kind::Constant, None),
            doclet("module:greet", Kind::Module, None),
            exported,
            doclet("Button", Kind::Component, None),
            doclet("ns", Kind::Namespace, None),
        ];
        let members = categorize(&doclets);
        assert_eq!(longnames(&members.classes), vec!["Foo"]);
        assert_eq!(longnames(&members.globals), vec!["helper", "LIMIT"]);
        assert_eq!(longnames(&members.modules), vec!["module:greet"]);
        assert_eq!(longnames(&members.components), vec!["Button"]);
        assert_eq!(longnames(&members.namespaces), vec!["ns"]);
        assert!(members.events.is_empty());
    }

    #[test]
    fn tree_nests_by_longname() {
        let doclets = vec![
            doclet("Foo", Kind::Class, None),
            doclet("Foo#run", Kind::Function, Some("Foo")),
            doclet("Foo.create", Kind::Function, Some("Foo")),
            doclet("module:widget", Kind::Module, None),
            doclet("module:widget~helper", Kind::Function, Some("module:widget")),
        ];
        let tree = tree(&doclets);

        let foo = tree.global.get(&["Foo"]).unwrap();
        assert_eq!(foo.kind, Some(Kind::Class));
        assert_eq!(foo.longname, "Foo");
        let run = tree.global.get(&["Foo", "#run"]).unwrap();
        assert_eq!(run.longname, "Foo#run");
        assert_eq!(run.doclet.map(|d| d.name()), Some("run"));
        assert!(tree.global.get(&["Foo", ".create"]).is_some());

        let helper = tree.module.get(&["/widget", "~helper"]).unwrap();
        assert_eq!(helper.longname, "module:widget~helper");
        assert_eq!(helper.kind, Some(Kind::Function));
    }

    #[test]
    fn intermediate_segments_without_doclets() {
        let doclets = vec![doclet("a.b.c", Kind::Member, Some("a.b"))];
        let tree = tree(&doclets);
        let b = tree.global.get(&["a", ".b"]).unwrap();
        assert_eq!(b.longname, "a.b");
        assert!(b.doclet.is_none());

        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["global"]["a"][".b"][".c"]["longname"], "a.b.c");
        assert_eq!(json["global"]["a"][".b"][".c"]["kind"], "member");
    }
}
