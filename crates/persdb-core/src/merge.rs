//! Three-way merge over body maps (C3b), per §4.3 steps 1-5.
use crate::diff::{ChangeTag, diff};
use crate::error::PersDbError;
use crate::header::Header;
use crate::newtypes::VersionId;
use crate::value::Body;

/// The outcome of a three-way merge: either a clean body, or a non-empty
/// conflict set naming the attributes that collided, alongside the body that
/// would result from preferring `left`'s values on every conflicting key
/// (§4.3 step 4: "the caller may still materialize a revision... holding the
/// left side's attribute values").
pub struct MergeOutcome {
    pub body: Body,
    pub conflicts: Vec<String>,
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }
}

/// Runs steps 1-4 of the three-way merge algorithm, returning the merged
/// body and the set of attributes (if any) that collided.
pub fn merge_bodies(left: &Body, right: &Body, base: &Body) -> MergeOutcome {
    let dl = diff(left, base);
    let dr = diff(right, base);

    let mut body = base.clone();
    let mut conflicts = Vec::new();

    let mut keys: Vec<&String> = dl.keys().chain(dr.keys()).collect();
    keys.sort();
    keys.dedup();

    for key in keys {
        let l = dl.get(key);
        let r = dr.get(key);
        match (l, r) {
            (Some(lt), Some(rt)) => {
                if is_conflicting(*lt, *rt, left.get(key), right.get(key)) {
                    conflicts.push(key.clone());
                    apply_side(&mut body, key, left);
                } else {
                    // Same tag, same resulting value (delete-vs-delete, or
                    // both sides converged on an identical change).
                    apply_side(&mut body, key, left);
                }
            }
            (Some(tag), None) => apply_tag(&mut body, key, *tag, left),
            (None, Some(tag)) => apply_tag(&mut body, key, *tag, right),
            (None, None) => {}
        }
    }

    conflicts.sort();
    conflicts.dedup();

    MergeOutcome { body, conflicts }
}

fn is_conflicting(
    lt: ChangeTag,
    rt: ChangeTag,
    left_val: Option<&crate::value::Value>,
    right_val: Option<&crate::value::Value>,
) -> bool {
    match (lt, rt) {
        (ChangeTag::Removed, ChangeTag::Removed) => false,
        (ChangeTag::Changed, ChangeTag::Changed) => left_val != right_val,
        (ChangeTag::Changed, ChangeTag::Removed) | (ChangeTag::Removed, ChangeTag::Changed) => {
            true
        }
        (ChangeTag::Added, ChangeTag::Added) => left_val != right_val,
        _ => false,
    }
}

fn apply_tag(body: &mut Body, key: &str, tag: ChangeTag, side: &Body) {
    match tag {
        ChangeTag::Removed => {
            body.remove(key);
        }
        ChangeTag::Added | ChangeTag::Changed => apply_side(body, key, side),
    }
}

fn apply_side(body: &mut Body, key: &str, side: &Body) {
    match side.get(key) {
        Some(v) => {
            body.insert(key.to_owned(), v.clone());
        }
        None => {
            body.remove(key);
        }
    }
}

/// Builds the merged revision's header per §4.3 step 5: parents sorted
/// lexicographically, a freshly generated version, `id` taken from (and
/// required to match between) both sides, `d` set only when both sides agree
/// the document is deleted.
pub fn merge_header(left: &Header, right: &Header, clean: bool) -> Result<Header, PersDbError> {
    if left.id != right.id {
        return Err(PersDbError::InvalidHeader {
            reason: format!("cannot merge revisions of different ids: {} vs {}", left.id, right.id),
        });
    }

    let mut pa = vec![left.v.clone(), right.v.clone()];
    pa.sort();

    let v = VersionId::generate().map_err(|e| PersDbError::InvalidHeader {
        reason: format!("random source: {e}"),
    })?;

    Ok(Header {
        id: left.id.clone(),
        v,
        pa,
        pe: left.pe.clone(),
        i: 0,
        d: left.d && right.d,
        c: !clean,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::value::Value;

    fn body(pairs: Vec<(&str, Value)>) -> Body {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    #[test]
    fn non_overlapping_changes_both_apply() {
        let base = body(vec![("name", Value::String("Acme".to_owned()))]);
        let left = body(vec![
            ("name", Value::String("Acme".to_owned())),
            ("city", Value::String("Berlin".to_owned())),
        ]);
        let right = body(vec![
            ("name", Value::String("Acme Corp".to_owned())),
        ]);
        let outcome = merge_bodies(&left, &right, &base);
        assert!(outcome.is_clean());
        assert_eq!(outcome.body.get("city"), Some(&Value::String("Berlin".to_owned())));
        assert_eq!(
            outcome.body.get("name"),
            Some(&Value::String("Acme Corp".to_owned()))
        );
    }

    #[test]
    fn both_sides_change_same_attribute_differently_conflicts() {
        let base = body(vec![("name", Value::String("Acme".to_owned()))]);
        let left = body(vec![("name", Value::String("Acme Inc".to_owned()))]);
        let right = body(vec![("name", Value::String("Acme GmbH".to_owned()))]);
        let outcome = merge_bodies(&left, &right, &base);
        assert_eq!(outcome.conflicts, vec!["name".to_owned()]);
        assert_eq!(
            outcome.body.get("name"),
            Some(&Value::String("Acme Inc".to_owned()))
        );
    }

    #[test]
    fn delete_vs_modify_is_a_conflict() {
        let base = body(vec![("name", Value::String("Acme".to_owned()))]);
        let left: Body = BTreeMap::new();
        let right = body(vec![("name", Value::String("Acme GmbH".to_owned()))]);
        let outcome = merge_bodies(&left, &right, &base);
        assert_eq!(outcome.conflicts, vec!["name".to_owned()]);
    }

    #[test]
    fn delete_vs_delete_is_silent() {
        let base = body(vec![("name", Value::String("Acme".to_owned()))]);
        let left: Body = BTreeMap::new();
        let right: Body = BTreeMap::new();
        let outcome = merge_bodies(&left, &right, &base);
        assert!(outcome.is_clean());
        assert!(!outcome.body.contains_key("name"));
    }

    #[test]
    fn both_sides_add_same_attribute_with_same_value_is_clean() {
        let base: Body = BTreeMap::new();
        let left = body(vec![("k", Value::Integer(1))]);
        let right = body(vec![("k", Value::Integer(1))]);
        let outcome = merge_bodies(&left, &right, &base);
        assert!(outcome.is_clean());
    }

    use std::collections::BTreeMap;

    #[test]
    fn merge_header_sorts_parents_and_requires_matching_id() {
        let id = crate::newtypes::DocId::try_from("x").expect("valid");
        let left = Header {
            id: id.clone(),
            v: VersionId::try_from("B").expect("valid"),
            pa: vec![],
            pe: None,
            i: 1,
            d: false,
            c: false,
        };
        let right = Header {
            id,
            v: VersionId::try_from("A").expect("valid"),
            pa: vec![],
            pe: None,
            i: 2,
            d: false,
            c: false,
        };
        let merged = merge_header(&left, &right, true).expect("merge");
        assert_eq!(merged.pa, vec![
            VersionId::try_from("A").expect("valid"),
            VersionId::try_from("B").expect("valid"),
        ]);
        assert!(!merged.c);
    }

    #[test]
    fn merge_header_rejects_mismatched_ids() {
        let left = Header {
            id: crate::newtypes::DocId::try_from("x").expect("valid"),
            v: VersionId::try_from("A").expect("valid"),
            pa: vec![],
            pe: None,
            i: 1,
            d: false,
            c: false,
        };
        let right = Header {
            id: crate::newtypes::DocId::try_from("y").expect("valid"),
            v: VersionId::try_from("B").expect("valid"),
            pa: vec![],
            pe: None,
            i: 2,
            d: false,
            c: false,
        };
        assert!(merge_header(&left, &right, true).is_err());
    }
}
