//! Cross-file processing of the doclets a run collected.
//!
//! Stages run in a fixed order, each over the output of the one before:
//! merge, prune, index, augment, borrow. Augment and borrow append to the
//! collection and keep the index current as they go.

pub mod augment;
pub mod borrow;
pub mod index;
pub mod members;
pub mod merge;
pub mod prune;

use tracing::debug;

use crate::doclet::Doclet;
use crate::plugin::Plugins;

pub use index::DocletIndex;
pub use members::{DocletTree, Members, TreeNode};

/// The final collection of a run and its index.
#[derive(Debug, Clone, Default)]
pub struct Processed {
    pub doclets: Vec<Doclet>,
    pub index: DocletIndex,
}

impl Processed {
    /// Doclets grouped by category for navigation.
    pub fn members(&self) -> Members<'_> {
        members::categorize(&self.doclets)
    }

    /// Nested longname tree over the collection.
    pub fn tree(&self) -> DocletTree<'_> {
        members::tree(&self.doclets)
    }

    /// All doclets recorded under `longname`.
    pub fn lookup(&self, longname: &str) -> Vec<&Doclet> {
        self.index
            .longname(longname)
            .iter()
            .filter_map(|&at| self.doclets.get(at))
            .collect()
    }
}

/// Run every stage over `doclets`. The `doclets_process_begin` and
/// `doclets_process_complete` hooks bracket the stages; the index is rebuilt
/// afterwards since the completing handlers may rewrite the collection.
pub fn process(mut doclets: Vec<Doclet>, plugins: &mut Plugins) -> Processed {
    plugins.doclets_process_begin.emit(&mut doclets);
    let received = doclets.len();

    let doclets = merge::merge_doclets(doclets);
    let mut doclets = prune::prune(doclets);
    let mut index = DocletIndex::build(&doclets);
    augment::augment_all(&mut doclets, &mut index);
    borrow::resolve_borrows(&mut doclets, &mut index);

    plugins.doclets_process_complete.emit(&mut doclets);
    let index = DocletIndex::build(&doclets);
    debug!(received, kept = doclets.len(), "doclets processed");
    Processed { doclets, index }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::{Kind, Scope};
    use crate::name;
    use crate::plugin::Outcome;

    fn doclet(longname: &str, kind: Kind) -> Doclet {
        let mut d = Doclet {
            name: Some(name::shorten(longname, None).name),
            kind: Some(kind),
            ..Default::default()
        };
        d.set_longname(longname);
        d
    }

    #[test]
    fn stages_run_in_order() {
        let mut base = doclet("Base", Kind::Class);
        base.description = Some("Base.".into());
        let mut speak = doclet("Base#speak", Kind::Function);
        speak.memberof = Some("Base".into());
        speak.scope = Some(Scope::Instance);
        let mut derived = doclet("Derived", Kind::Class);
        derived.augment("Base");
        let mut hidden = doclet("hidden", Kind::Function);
        hidden.undocumented = true;

        let processed = process(vec![base, speak, derived, hidden], &mut Plugins::default());
        let names: Vec<&str> = processed.doclets.iter().map(|d| d.longname()).collect();
        assert_eq!(names, vec!["Base", "Base#speak", "Derived", "Derived#speak"]);
        assert_eq!(processed.lookup("Derived#speak").len(), 1);
        assert!(processed.lookup("hidden").is_empty());
    }

    #[test]
    fn hooks_bracket_the_stages() {
        let mut plugins = Plugins::default();
        plugins.doclets_process_begin.push(|doclets: &mut Vec<Doclet>| {
            doclets.push(doclet("injected", Kind::Member));
            Outcome::Continue
        });
        plugins.doclets_process_complete.push(|doclets: &mut Vec<Doclet>| {
            doclets.retain(|d| d.longname() != "dropped");
            Outcome::Continue
        });
        let processed = process(
            vec![doclet("kept", Kind::Member), doclet("dropped", Kind::Member)],
            &mut plugins,
        );
        let names: Vec<&str> = processed.doclets.iter().map(|d| d.longname()).collect();
        assert_eq!(names, vec!["kept", "injected"]);
        assert_eq!(processed.index.longname("injected"), &[1]);
    }
}
