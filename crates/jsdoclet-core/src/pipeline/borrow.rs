//! `@borrows` resolution.

use tracing::{debug, warn};

use crate::doclet::{Doclet, Scope};
use crate::name::{self, PUNC_INSTANCE, PUNC_STATIC};
use crate::pipeline::DocletIndex;

/// Where a borrowed doclet lands, relative to the borrower.
fn borrowed_as(target: &str) -> (Scope, char, String) {
    let target = match target.strip_prefix("prototype.") {
        Some(rest) => format!("{PUNC_INSTANCE}{rest}"),
        None => target.to_string(),
    };
    let parts: Vec<&str> = target.split(PUNC_INSTANCE).collect();
    if let [_, member] = parts.as_slice() {
        (Scope::Instance, PUNC_INSTANCE, member.to_string())
    } else {
        (Scope::Static, PUNC_STATIC, name::shorten(&target, None).name)
    }
}

/// Clone the doclets each borrow record names onto the borrower, then clear
/// the records. Sources are looked up in `index`, which must be current.
pub fn resolve_borrows(doclets: &mut Vec<Doclet>, index: &mut DocletIndex) {
    for at in std::mem::take(&mut index.borrowed) {
        let records = std::mem::take(&mut doclets[at].borrowed);
        let owner = doclets[at].longname().to_string();

        for record in records {
            let sources = index.longname(&record.from).to_vec();
            if sources.is_empty() {
                warn!(borrower = %owner, from = %record.from, "cannot borrow an unknown symbol");
                continue;
            }
            let target = record.alias.as_deref().unwrap_or(&record.from);
            let (scope, punc, member) = borrowed_as(target);
            for source in sources {
                let mut clone = doclets[source].clone();
                clone.scope = Some(scope);
                clone.name = Some(member.clone());
                clone.memberof = Some(owner.clone());
                clone.longname = Some(format!("{owner}{punc}{member}"));
                debug!(from = %record.from, to = clone.longname(), "borrowed");
                index.insert(doclets.len(), &clone);
                doclets.push(clone);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doclet::Kind;

    fn named(longname: &str, kind: Kind) -> Doclet {
        Doclet {
            name: Some(name::shorten(longname, None).name),
            longname: Some(longname.into()),
            kind: Some(kind),
            ..Default::default()
        }
    }

    fn run(mut doclets: Vec<Doclet>) -> (Vec<Doclet>, DocletIndex) {
        let mut index = DocletIndex::build(&doclets);
        resolve_borrows(&mut doclets, &mut index);
        (doclets, index)
    }

    #[test]
    fn static_borrow_takes_the_short_name() {
        let mut source = named("A.B", Kind::Function);
        source.description = Some("Shared helper.".into());
        let mut borrower = named("C", Kind::Namespace);
        borrower.borrow("A.B", None);

        let (doclets, index) = run(vec![source, borrower]);
        assert_eq!(doclets.len(), 3);
        let clone = &doclets[2];
        assert_eq!(clone.longname(), "C.B");
        assert_eq!(clone.name(), "B");
        assert_eq!(clone.memberof.as_deref(), Some("C"));
        assert_eq!(clone.scope, Some(Scope::Static));
        assert_eq!(clone.description.as_deref(), Some("Shared helper."));
        assert!(doclets[1].borrowed.is_empty());
        assert!(index.borrowed.is_empty());
        assert_eq!(index.longname("C.B"), &[2]);
    }

    #[test]
    fn prototype_alias_lands_on_the_instance() {
        let mut borrower = named("C", Kind::Class);
        borrower.borrow("A.B", Some("prototype.run"));

        let (doclets, _) = run(vec![named("A.B", Kind::Function), borrower]);
        assert_eq!(doclets[2].longname(), "C#run");
        assert_eq!(doclets[2].scope, Some(Scope::Instance));
    }

    #[test]
    fn unknown_source_is_skipped() {
        let mut borrower = named("C", Kind::Class);
        borrower.borrow("nowhere", None);
        let (doclets, _) = run(vec![borrower]);
        assert_eq!(doclets.len(), 1);
        assert!(doclets[0].borrowed.is_empty());
    }

    #[test]
    fn alias_forms() {
        assert_eq!(borrowed_as("trim"), (Scope::Static, '.', "trim".into()));
        assert_eq!(borrowed_as("util.trim"), (Scope::Static, '.', "trim".into()));
        assert_eq!(borrowed_as("Foo#trim"), (Scope::Instance, '#', "trim".into()));
    }
}
