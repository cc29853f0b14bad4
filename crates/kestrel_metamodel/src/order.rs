//! Member ordering.
//!
//! Members with a `MemberOrder` sequence come first, sorted by sequence.
//! Members named by a legacy `fieldOrder()`/`actionOrder()` hint follow in
//! hint order. Everything else keeps declaration order. Ties break on id,
//! so the result never depends on hash order.

use core::cmp::Ordering;

use crate::member::Member;

/// Compares dewey-decimal sequences such as `1.10` and `1.2`. Numeric
/// components compare numerically, others as text; a prefix sorts first.
///
/// ```
/// use core::cmp::Ordering;
/// use kestrel_metamodel::order::compare_sequences;
///
/// assert_eq!(compare_sequences("1.2", "1.10"), Ordering::Less);
/// assert_eq!(compare_sequences("2", "2.1"), Ordering::Less);
/// assert_eq!(compare_sequences("b", "a"), Ordering::Greater);
/// ```
#[must_use]
pub fn compare_sequences(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');
    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ordering = match (l.trim().parse::<u64>(), r.trim().parse::<u64>()) {
                    (Ok(l), Ok(r)) => l.cmp(&r),
                    (Ok(_), Err(_)) => Ordering::Less,
                    (Err(_), Ok(_)) => Ordering::Greater,
                    (Err(_), Err(_)) => l.cmp(r),
                };
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Group {
    Sequenced,
    Hinted,
    Declared,
}

/// Sorts members into display order. `hint` is the legacy order list for
/// this kind of member; it may be empty.
pub(crate) fn sort_members<M: Member>(members: &mut [M], hint: &[String]) {
    let position = |member: &M| hint.iter().position(|id| id == member.id());
    let group = |member: &M| {
        if member.member_order().is_some() {
            Group::Sequenced
        } else if position(member).is_some() {
            Group::Hinted
        } else {
            Group::Declared
        }
    };

    members.sort_by(|a, b| {
        let (group_a, group_b) = (group(a), group(b));
        group_a
            .cmp(&group_b)
            .then_with(|| match group_a {
                Group::Sequenced => compare_sequences(
                    a.member_order().unwrap_or_default(),
                    b.member_order().unwrap_or_default(),
                ),
                Group::Hinted => position(a).cmp(&position(b)),
                Group::Declared => a.declaration_index().cmp(&b.declaration_index()),
            })
            .then_with(|| a.id().cmp(b.id()))
    });
}

/// Ids named by `hint` that no member carries.
pub(crate) fn unknown_ids<M: Member>(members: &[M], hint: &[String]) -> Vec<String> {
    hint.iter()
        .filter(|id| !members.iter().any(|member| member.id() == id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::facet::{FacetHolder, MemberOrderFacet, Precedence};
    use crate::ident::{ClassName, FeatureType, Identifier, LogicalType};
    use crate::member::{MemberCore, ObjectMember, OneToOneAssociation};

    fn member(id: &str, index: usize, sequence: Option<&str>) -> ObjectMember {
        let mut facets = FacetHolder::new();
        if let Some(sequence) = sequence {
            facets.add(
                MemberOrderFacet {
                    sequence: sequence.into(),
                },
                Precedence::Default,
                "test",
            );
        }
        ObjectMember::Property(Arc::new(OneToOneAssociation {
            core: MemberCore::new(
                Identifier::property_or_collection(LogicalType::of(ClassName::new("a.A")), id),
                FeatureType::Property,
                ClassName::new("kestrel.lang.String"),
                facets,
                None,
                index,
            ),
        }))
    }

    fn ids(members: &[ObjectMember]) -> Vec<&str> {
        members.iter().map(Member::id).collect()
    }

    #[test]
    fn sequences_are_numeric_per_component() {
        let mut sequences = vec!["1.10", "1.2", "10", "2", "1", "1.2.1"];
        sequences.sort_by(|a, b| compare_sequences(a, b));
        assert_eq!(sequences, vec!["1", "1.2", "1.2.1", "1.10", "2", "10"]);
    }

    #[test]
    fn sequenced_then_hinted_then_declared() {
        let mut members = vec![
            member("notes", 0, None),
            member("customer", 1, None),
            member("total", 2, Some("2")),
            member("number", 3, Some("1")),
            member("placedOn", 4, None),
        ];
        sort_members(&mut members, &["placedOn".to_owned(), "customer".to_owned()]);
        assert_eq!(ids(&members), vec!["number", "total", "placedOn", "customer", "notes"]);
    }

    #[test]
    fn equal_sequences_break_on_id() {
        let mut members = vec![member("zeta", 0, Some("1")), member("alpha", 1, Some("1"))];
        sort_members(&mut members, &[]);
        assert_eq!(ids(&members), vec!["alpha", "zeta"]);
    }

    #[test]
    fn unknown_hint_entries_are_reported() {
        let members = vec![member("number", 0, None)];
        let unknown = unknown_ids(&members, &["number".to_owned(), "ghost".to_owned()]);
        assert_eq!(unknown, vec!["ghost".to_owned()]);
    }
}
