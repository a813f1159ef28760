//! A single perspective's append-only revision DAG (C4).
//!
//! One [`Tree`] owns one scope (`local`, `stage`, or a named remote) inside
//! a shared [`OrderedStore`]; all four key-codec namespaces for that scope
//! live side by side in the same underlying store.
use std::ops::Bound;
use std::sync::Arc;

use crate::error::PersDbError;
use crate::header::Header;
use crate::keycodec::{self, Perspective, Tag};
use crate::kv::{OrderedStore, WriteBatch};
use crate::newtypes::VersionId;
use crate::revision::{self, Revision};
use crate::value::Body;

/// Aggregate counts returned by [`Tree::stats`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TreeStats {
    pub heads_count: u64,
    pub heads_conflict: u64,
    pub heads_deleted: u64,
}

/// One perspective over a shared ordered store.
pub struct Tree {
    store: Arc<dyn OrderedStore>,
    scope: Vec<u8>,
    perspective: Perspective,
}

impl Tree {
    pub fn new(store: Arc<dyn OrderedStore>, perspective: Perspective) -> Self {
        let scope = keycodec::scope_prefix(&perspective);
        Self {
            store,
            scope,
            perspective,
        }
    }

    pub fn perspective(&self) -> &Perspective {
        &self.perspective
    }

    fn next_insertion_index(&self) -> Result<u64, PersDbError> {
        let mut end = self.scope.clone();
        end.push(Tag::Dag.byte());
        end.push(0xff);
        let mut start = self.scope.clone();
        start.push(Tag::Dag.byte());
        let last = self
            .store
            .range(Bound::Included(start), Bound::Excluded(end), true)
            .map_err(PersDbError::from)?
            .next();
        match last {
            Some((key, _)) => {
                let i = keycodec::decode_dag_key(&self.scope, &key)
                    .map_err(|e| PersDbError::InvalidHeader { reason: e.to_string() })?;
                Ok(i + 1)
            }
            None => Ok(1),
        }
    }

    fn version_known(&self, v: &VersionId) -> Result<bool, PersDbError> {
        let key = keycodec::version_key(&self.scope, v);
        Ok(self.store.get(&key).map_err(PersDbError::from)?.is_some())
    }

    /// Validates, assigns an insertion index, and durably appends one
    /// revision, updating the head set per §4.4.
    ///
    /// `extra_known` is consulted for any `pa` entry this tree does not
    /// itself recognize, letting a `MergeTree` accept parents that only
    /// exist in a fallback tree.
    pub fn append(
        &self,
        header_fields: &Body,
        body: &Body,
        extra_known: &dyn Fn(&VersionId) -> bool,
    ) -> Result<u64, PersDbError> {
        let i = self.next_insertion_index()?;
        let header = Header::from_candidate(header_fields, i)?;

        if self.version_known(&header.v)? {
            return Err(PersDbError::Duplicate {
                v: header.v.to_string(),
            });
        }

        for parent in &header.pa {
            if !self.version_known(parent)? && !extra_known(parent) {
                return Err(PersDbError::UnknownParent {
                    v: parent.to_string(),
                });
            }
        }

        let rev = Revision {
            header: header.clone(),
            body: body.clone(),
        };
        let encoded =
            revision::encode_revision(&rev).map_err(|e| PersDbError::InvalidHeader {
                reason: e.to_string(),
            })?;

        let mut batch = WriteBatch::new();
        batch.put(keycodec::dag_key(&self.scope, i), encoded);
        batch.put(
            keycodec::version_key(&self.scope, &header.v),
            i.to_be_bytes().to_vec(),
        );
        batch.put(
            keycodec::id_key(&self.scope, header.id.as_bytes(), &header.v),
            i.to_be_bytes().to_vec(),
        );

        for parent in &header.pa {
            batch.delete(keycodec::head_key(&self.scope, header.id.as_bytes(), parent));
        }
        batch.put(
            keycodec::head_key(&self.scope, header.id.as_bytes(), &header.v),
            encode_head_marker(header.d, header.c),
        );

        self.store.write_batch(batch).map_err(PersDbError::from)?;
        log::debug!("appended i={i} id={} v={}", header.id, header.v);
        Ok(i)
    }

    /// Looks up a revision by its dag-insertion index.
    fn get_by_index(&self, i: u64) -> Result<Option<Revision>, PersDbError> {
        let key = keycodec::dag_key(&self.scope, i);
        match self.store.get(&key).map_err(PersDbError::from)? {
            Some(bytes) => revision::decode_revision(&bytes)
                .map(Some)
                .map_err(|e| PersDbError::InvalidHeader { reason: e.to_string() }),
            None => Ok(None),
        }
    }

    /// `V` index lookup.
    pub fn get_by_version(&self, v: &VersionId) -> Result<Option<Revision>, PersDbError> {
        let key = keycodec::version_key(&self.scope, v);
        match self.store.get(&key).map_err(PersDbError::from)? {
            Some(bytes) => {
                let arr: [u8; 8] = bytes
                    .try_into()
                    .map_err(|_| PersDbError::InvalidHeader {
                        reason: "corrupt version index entry".to_owned(),
                    })?;
                self.get_by_index(u64::from_be_bytes(arr))
            }
            None => Ok(None),
        }
    }

    /// Returns the current head set for `id`.
    pub fn get_heads(&self, id: &[u8]) -> Result<Vec<VersionId>, PersDbError> {
        let (start, end) = keycodec::head_range_for_id(&self.scope, id);
        let iter = self
            .store
            .range(Bound::Included(start), Bound::Excluded(end), false)
            .map_err(PersDbError::from)?;
        iter.map(|(key, _)| {
            let (_, v) = keycodec::decode_membership_key(&self.scope, Tag::Heads, &key)
                .map_err(|e| PersDbError::InvalidHeader { reason: e.to_string() })?;
            VersionId::try_from(v.as_str()).map_err(|e| PersDbError::InvalidHeader {
                reason: e.to_string(),
            })
        })
        .collect()
    }

    /// Options accepted by [`Tree::iterate_insertion_order`].
    pub fn iterate_insertion_order(
        &self,
        reverse: bool,
        start: Option<u64>,
        limit: Option<usize>,
    ) -> Result<Vec<Revision>, PersDbError> {
        let mut lo = self.scope.clone();
        lo.push(Tag::Dag.byte());
        let mut hi = lo.clone();
        hi.push(0xff);

        let lower = match start {
            Some(i) if !reverse => Bound::Included(keycodec::dag_key(&self.scope, i)),
            _ => Bound::Included(lo),
        };
        let upper = match start {
            Some(i) if reverse => Bound::Included(keycodec::dag_key(&self.scope, i)),
            _ => Bound::Excluded(hi),
        };

        let iter = self
            .store
            .range(lower, upper, reverse)
            .map_err(PersDbError::from)?;

        let mut out = Vec::new();
        for (_, bytes) in iter {
            if let Some(limit) = limit {
                if out.len() >= limit {
                    break;
                }
            }
            let rev = revision::decode_revision(&bytes)
                .map_err(|e| PersDbError::InvalidHeader { reason: e.to_string() })?;
            out.push(rev);
        }
        Ok(out)
    }

    /// Aggregate head-set counts per §4.4.
    pub fn stats(&self) -> Result<TreeStats, PersDbError> {
        let mut lo = self.scope.clone();
        lo.push(Tag::Heads.byte());
        let mut hi = lo.clone();
        hi.push(0xff);
        let iter = self
            .store
            .range(Bound::Included(lo), Bound::Excluded(hi), false)
            .map_err(PersDbError::from)?;

        let mut stats = TreeStats::default();
        for (_, marker) in iter {
            let (d, c) = decode_head_marker(&marker);
            stats.heads_count += 1;
            if c {
                stats.heads_conflict += 1;
            }
            if d {
                stats.heads_deleted += 1;
            }
        }
        Ok(stats)
    }
}

/// Encodes the `(d, c)` flag pair stored alongside each head-set entry.
fn encode_head_marker(d: bool, c: bool) -> Vec<u8> {
    vec![u8::from(d), u8::from(c)]
}

fn decode_head_marker(bytes: &[u8]) -> (bool, bool) {
    match bytes {
        [d, c] => (*d != 0, *c != 0),
        _ => (false, false),
    }
}
