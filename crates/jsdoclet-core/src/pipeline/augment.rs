//! Inherited instance members.

use std::collections::HashSet;

use tracing::trace;

use crate::doclet::{Doclet, Scope};
use crate::name::PUNC_INSTANCE;
use crate::pipeline::DocletIndex;

/// Give every class that augments another a copy of each instance member
/// of the base it does not define itself. Bases are completed before the
/// classes deriving from them, so members travel down whole chains.
pub fn augment_all(doclets: &mut Vec<Doclet>, index: &mut DocletIndex) {
    let derived: Vec<String> = doclets
        .iter()
        .filter(|d| !d.augments.is_empty())
        .map(|d| d.longname().to_string())
        .collect();
    if derived.is_empty() {
        return;
    }

    let mut done = HashSet::new();
    for longname in derived {
        augment_class(doclets, index, &longname, &mut done);
    }
}

fn augment_class(
    doclets: &mut Vec<Doclet>,
    index: &mut DocletIndex,
    longname: &str,
    done: &mut HashSet<String>,
) {
    // Inserting before recursing also breaks cycles.
    if !done.insert(longname.to_string()) {
        return;
    }
    let bases: Vec<String> = index
        .longname(longname)
        .iter()
        .flat_map(|&at| doclets[at].augments.clone())
        .collect();

    for base in bases {
        augment_class(doclets, index, &base, done);

        let own: HashSet<String> = doclets
            .iter()
            .filter(|d| d.memberof.as_deref() == Some(longname))
            .map(|d| d.name().to_string())
            .collect();
        let inherited: Vec<Doclet> = doclets
            .iter()
            .filter(|d| {
                d.memberof.as_deref() == Some(base.as_str())
                    && d.scope == Some(Scope::Instance)
                    && !own.contains(d.name())
            })
            .map(|member| {
                let mut copy = member.clone();
                copy.inherits = Some(member.longname().to_string());
                copy.inherited = true;
                copy.memberof = Some(longname.to_string());
                copy.longname = Some(format!("{longname}{PUNC_INSTANCE}{}", member.name()));
                copy
            })
            .collect();

        for copy in inherited {
            trace!(from = copy.inherits.as_deref(), to = copy.longname(), "inherited member");
            index.insert(doclets.len(), &copy);
            doclets.push(copy);
        }
    }
}
