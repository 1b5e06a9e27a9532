use crate::doclet::Doclet;
use crate::name::ANONYMOUS;

/// Whether a doclet survives pruning.
pub fn keeps(doclet: &Doclet) -> bool {
    !doclet.undocumented && !doclet.ignore && doclet.memberof.as_deref() != Some(ANONYMOUS)
}

/// Drop undocumented and ignored doclets and those owned by an anonymous
/// scope. Survivors keep their relative order.
pub fn prune(mut doclets: Vec<Doclet>) -> Vec<Doclet> {
    doclets.retain(keeps);
    doclets
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
    fn drops_hidden_and_keeps_order() {
        let mut undocumented = named("b");
        undocumented.undocumented = true;
        let mut ignored = named("c");
        ignored.ignore = true;
        let mut local = named("<anonymous>~tmp");
        local.memberof = Some(ANONYMOUS.into());

        let kept = prune(vec![named("a"), undocumented, ignored, local, named("e"), named("d")]);
        let names: Vec<&str> = kept.iter().map(|d| d.longname()).collect();
        assert_eq!(names, vec!["a", "e", "d"]);
    }
}
