//! Pairwise tree comparison (C7), classifying each document id in `t1`
//! against the same id's heads in `t2`.
use std::collections::BTreeSet;

use crate::error::PersDbError;
use crate::newtypes::VersionId;
use crate::tree::Tree;
use crate::value::{Body, Value};

/// The classification of one `id` comparison, per §4.7.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompareEntry {
    /// `id` absent from `t2`.
    Missing { id: Vec<u8> },
    /// `t2` has exactly one head and bodies are equal under the filter.
    Equal { id: Vec<u8> },
    /// `t2` has exactly one head but bodies differ under the filter.
    Inequal { id: Vec<u8>, t2_head: VersionId },
    /// `t2` has more than one head; one entry per head.
    Multiple { id: Vec<u8>, t2_head: VersionId },
}

/// Restricts attribute comparison to `include_attrs` (if non-empty), else to
/// every key except `exclude_attrs`.
#[derive(Debug, Clone, Default)]
pub struct AttrFilter {
    pub include_attrs: Vec<String>,
    pub exclude_attrs: Vec<String>,
}

impl AttrFilter {
    fn apply(&self, body: &Body) -> Body {
        body.iter()
            .filter(|(k, _)| {
                if self.include_attrs.is_empty() {
                    !self.exclude_attrs.contains(k)
                } else {
                    self.include_attrs.contains(k)
                }
            })
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

/// Compares every document id present in `t1`'s head set against `t2`.
pub fn compare(t1: &Tree, t2: &Tree, filter: &AttrFilter) -> Result<Vec<CompareEntry>, PersDbError> {
    let ids = ids_with_heads(t1)?;
    let mut out = Vec::new();

    for id in ids {
        let t2_heads = t2.get_heads(&id)?;
        match t2_heads.as_slice() {
            [] => out.push(CompareEntry::Missing { id }),
            [single] => {
                let t1_heads = t1.get_heads(&id)?;
                let Some(t1_head) = latest_head(t1, &t1_heads)? else {
                    continue;
                };
                let t1_body = body_of(t1, &t1_head)?;
                let t2_body = body_of(t2, single)?;
                if filter.apply(&t1_body) == filter.apply(&t2_body) {
                    out.push(CompareEntry::Equal { id });
                } else {
                    out.push(CompareEntry::Inequal {
                        id,
                        t2_head: single.clone(),
                    });
                }
            }
            many => {
                for head in many {
                    out.push(CompareEntry::Multiple {
                        id: id.clone(),
                        t2_head: head.clone(),
                    });
                }
            }
        }
    }

    Ok(out)
}

/// Picks the head with the greatest insertion index (§8 invariant 2: `i` is
/// a dense, strictly increasing prefix), not the lexicographically-first one
/// `get_heads` returns (it is ordered by the version-string `H`-namespace
/// key, which carries no temporal meaning).
fn latest_head(tree: &Tree, heads: &[VersionId]) -> Result<Option<VersionId>, PersDbError> {
    let mut best: Option<(u64, VersionId)> = None;
    for head in heads {
        let Some(rev) = tree.get_by_version(head)? else {
            continue;
        };
        if best.as_ref().is_none_or(|(i, _)| rev.header.i > *i) {
            best = Some((rev.header.i, head.clone()));
        }
    }
    Ok(best.map(|(_, v)| v))
}

fn body_of(tree: &Tree, v: &VersionId) -> Result<Body, PersDbError> {
    tree.get_by_version(v)?
        .map(|rev| rev.body)
        .ok_or(PersDbError::NotFound)
}

fn ids_with_heads(tree: &Tree) -> Result<Vec<Vec<u8>>, PersDbError> {
    let revisions = tree.iterate_insertion_order(false, None, None)?;
    let mut seen = BTreeSet::new();
    let mut ids = Vec::new();
    for rev in revisions {
        let id = rev.header.id.as_bytes().to_vec();
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    Ok(ids)
}
