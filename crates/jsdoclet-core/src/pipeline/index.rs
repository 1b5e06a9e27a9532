use std::collections::BTreeMap;

use crate::doclet::Doclet;

/// Positions into a doclet collection, by longname.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocletIndex {
    by_longname: BTreeMap<String, Vec<usize>>,
    documented: BTreeMap<String, Vec<usize>>,
    /// Doclets that still carry borrow records.
    pub borrowed: Vec<usize>,
}

impl DocletIndex {
    pub fn build(doclets: &[Doclet]) -> Self {
        let mut index = DocletIndex::default();
        for (at, doclet) in doclets.iter().enumerate() {
            index.insert(at, doclet);
        }
        index
    }

    /// Record the doclet stored at position `at`.
    pub fn insert(&mut self, at: usize, doclet: &Doclet) {
        let longname = doclet.longname();
        self.by_longname.entry(longname.to_string()).or_default().push(at);
        if !doclet.undocumented {
            self.documented.entry(longname.to_string()).or_default().push(at);
        }
        if !doclet.borrowed.is_empty() {
            self.borrowed.push(at);
        }
    }

    pub fn longname(&self, longname: &str) -> &[usize] {
        self.by_longname.get(longname).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Positions of the documented doclets named `longname`.
    pub fn documented(&self, longname: &str) -> &[usize] {
        self.documented.get(longname).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, longname: &str) -> bool {
        self.by_longname.contains_key(longname)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(longname: &str) -> Doclet {
        Doclet {
            longname: Some(longname.into()),
            ..Default::default()
        }
    }

    #[test]
    fn one_pass_over_the_collection() {
        let mut undocumented = named("a");
        undocumented.undocumented = true;
        let mut borrower = named("c");
        borrower.borrow("a", None);

        let index = DocletIndex::build(&[named("a"), undocumented, borrower]);
        assert_eq!(index.longname("a"), &[0, 1]);
        assert_eq!(index.documented("a"), &[0]);
        assert_eq!(index.borrowed, vec![2]);
        assert!(index.contains("c"));
        assert!(index.longname("missing").is_empty());
    }
}
