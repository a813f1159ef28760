//! Attribute-level structural diff between two body maps (C3a).
//!
//! Compares two [`Body`] maps key by key and tags each differing attribute
//! with `'+'` (added), `'~'` (changed), or `'-'` (removed), per §4.3. Keys
//! present and structurally equal in both maps are omitted from the result.
use std::collections::BTreeMap;

use crate::value::{Body, Value};

/// The three attribute-level change tags named in §4.3.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeTag {
    Added,
    Changed,
    Removed,
}

impl ChangeTag {
    /// The single-character tag used in the design's notation.
    pub fn as_char(self) -> char {
        match self {
            Self::Added => '+',
            Self::Changed => '~',
            Self::Removed => '-',
        }
    }
}

/// Computes the attribute-level diff from `a` to `b`.
///
/// A key present only in `a` is `Added`, present only in `b` is `Removed`,
/// present in both but structurally unequal is `Changed`. Equal values are
/// not present in the result at all.
pub fn diff(a: &Body, b: &Body) -> BTreeMap<String, ChangeTag> {
    let mut tags = BTreeMap::new();

    for (key, a_val) in a {
        match b.get(key) {
            None => {
                tags.insert(key.clone(), ChangeTag::Added);
            }
            Some(b_val) if b_val != a_val => {
                tags.insert(key.clone(), ChangeTag::Changed);
            }
            Some(_) => {}
        }
    }

    for key in b.keys() {
        if !a.contains_key(key) {
            tags.insert(key.clone(), ChangeTag::Removed);
        }
    }

    tags
}

/// Deep structural equality between two bodies, independent of key order.
pub fn bodies_equal(a: &Body, b: &Body) -> bool {
    a == b
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    fn body(pairs: Vec<(&str, Value)>) -> Body {
        pairs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    /// S2: `foo` present only in `a` is `Added`, `qux` present only in `b` is
    /// `Removed`, `baz`/`fubar` changed in both are `Changed`.
    #[test]
    fn scenario_s2_mixed_diff() {
        let mut fubar_a = BTreeMap::new();
        fubar_a.insert("a".to_owned(), Value::String("b".to_owned()));
        fubar_a.insert("c".to_owned(), Value::String("d".to_owned()));
        let mut fubar_b = BTreeMap::new();
        fubar_b.insert("a".to_owned(), Value::String("b".to_owned()));
        fubar_b.insert("c".to_owned(), Value::String("e".to_owned()));

        let a = body(vec![
            ("foo", Value::String("bar".to_owned())),
            ("bar", Value::String("baz".to_owned())),
            ("baz", Value::String("qux".to_owned())),
            ("fubar", Value::Object(fubar_a)),
        ]);
        let b = body(vec![
            ("bar", Value::String("baz".to_owned())),
            ("baz", Value::String("quux".to_owned())),
            ("qux", Value::String("raboof".to_owned())),
            ("fubar", Value::Object(fubar_b)),
        ]);

        let tags = diff(&a, &b);
        assert_eq!(tags.get("foo"), Some(&ChangeTag::Added));
        assert_eq!(tags.get("baz"), Some(&ChangeTag::Changed));
        assert_eq!(tags.get("qux"), Some(&ChangeTag::Removed));
        assert_eq!(tags.get("fubar"), Some(&ChangeTag::Changed));
        assert_eq!(tags.len(), 4);
    }

    /// S1: identical bodies produce an empty diff.
    #[test]
    fn scenario_s1_empty_diff() {
        let a = body(vec![("k", Value::Integer(1))]);
        let b = a.clone();
        assert!(diff(&a, &b).is_empty());
    }

    #[test]
    fn nested_object_change_is_reported_on_top_level_key() {
        let mut inner_a = BTreeMap::new();
        inner_a.insert("zip".to_owned(), Value::String("10115".to_owned()));
        let mut inner_b = BTreeMap::new();
        inner_b.insert("zip".to_owned(), Value::String("10117".to_owned()));

        let a = body(vec![("address", Value::Object(inner_a))]);
        let b = body(vec![("address", Value::Object(inner_b))]);
        let tags = diff(&a, &b);
        assert_eq!(tags.get("address"), Some(&ChangeTag::Changed));
    }

    #[test]
    fn change_tag_chars_match_design_notation() {
        assert_eq!(ChangeTag::Added.as_char(), '+');
        assert_eq!(ChangeTag::Changed.as_char(), '~');
        assert_eq!(ChangeTag::Removed.as_char(), '-');
    }
}
