//! The local/stage/remote MergeTree (C5): LCA computation and merge routing.
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Arc;

use crate::error::PersDbError;
use crate::header::Header;
use crate::keycodec::Perspective;
use crate::kv::OrderedStore;
use crate::merge::{self, MergeOutcome};
use crate::newtypes::VersionId;
use crate::revision::Revision;
use crate::tree::{Tree, TreeStats};
use crate::value::Body;

/// Owns a fixed local tree, a stage tree, and a mapping from perspective
/// name to remote tree, per §4.5.
pub struct MergeTree {
    local: Tree,
    stage: Tree,
    remotes: Vec<(String, Tree)>,
}

impl MergeTree {
    pub fn new(store: Arc<dyn OrderedStore>, remote_names: &[String]) -> Self {
        let local = Tree::new(Arc::clone(&store), Perspective::Local);
        let stage = Tree::new(Arc::clone(&store), Perspective::Stage);
        let remotes = remote_names
            .iter()
            .map(|name| {
                (
                    name.clone(),
                    Tree::new(Arc::clone(&store), Perspective::Remote(name.clone())),
                )
            })
            .collect();
        Self {
            local,
            stage,
            remotes,
        }
    }

    pub fn local_tree(&self) -> &Tree {
        &self.local
    }

    pub fn stage_tree(&self) -> &Tree {
        &self.stage
    }

    pub fn remote_trees(&self) -> &[(String, Tree)] {
        &self.remotes
    }

    fn all_trees(&self) -> impl Iterator<Item = &Tree> {
        std::iter::once(&self.local)
            .chain(std::iter::once(&self.stage))
            .chain(self.remotes.iter().map(|(_, t)| t))
    }

    /// Resolves across trees in order: local, stage, then each remote.
    pub fn get_by_version(&self, v: &VersionId) -> Result<Option<Revision>, PersDbError> {
        for tree in self.all_trees() {
            if let Some(rev) = tree.get_by_version(v)? {
                return Ok(Some(rev));
            }
        }
        Ok(None)
    }

    fn parents_of(&self, v: &VersionId) -> Result<Vec<VersionId>, PersDbError> {
        Ok(self
            .get_by_version(v)?
            .map(|rev| rev.header.pa)
            .unwrap_or_default())
    }

    fn insertion_index_of(&self, v: &VersionId) -> Result<u64, PersDbError> {
        Ok(self.get_by_version(v)?.map(|rev| rev.header.i).unwrap_or(0))
    }

    /// Reverse BFS from `v1` and `v2`, coloring each visited ancestor with the
    /// set of sources (`v1`, `v2`, or both) that can reach it. A node colored
    /// by both sources is a common ancestor; a common ancestor dominated by
    /// another already-found common ancestor (i.e. reachable from it) is
    /// removed, leaving only the lowest ones. Ties broken by ascending `i`.
    pub fn lca(&self, v1: &VersionId, v2: &VersionId) -> Result<Vec<VersionId>, PersDbError> {
        let mut color: BTreeMap<VersionId, u8> = BTreeMap::new();
        let mut queue: VecDeque<VersionId> = VecDeque::new();

        color.insert(v1.clone(), 0b01);
        color.insert(v2.clone(), 0b10);
        queue.push_back(v1.clone());
        queue.push_back(v2.clone());

        let mut common = BTreeSet::new();

        while let Some(current) = queue.pop_front() {
            let current_color = *color.get(&current).unwrap_or(&0);
            if current_color == 0b11 {
                common.insert(current.clone());
            }
            for parent in self.parents_of(&current)? {
                let existing = color.get(&parent).copied().unwrap_or(0);
                let merged = existing | current_color;
                if merged != existing {
                    color.insert(parent.clone(), merged);
                    queue.push_back(parent);
                }
            }
        }

        // Remove any common ancestor reachable from another common ancestor:
        // only the lowest (most recent) ones survive.
        let mut lowest: Vec<VersionId> = Vec::new();
        'outer: for candidate in &common {
            for other in &common {
                if other == candidate {
                    continue;
                }
                if self.is_ancestor(candidate, other)? {
                    continue 'outer;
                }
            }
            lowest.push(candidate.clone());
        }

        let mut indexed: Vec<(u64, VersionId)> = lowest
            .into_iter()
            .map(|v| Ok((self.insertion_index_of(&v)?, v)))
            .collect::<Result<_, PersDbError>>()?;
        indexed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        Ok(indexed.into_iter().map(|(_, v)| v).collect())
    }

    /// Whether `ancestor` can reach `descendant` by following parent edges.
    fn is_ancestor(&self, ancestor: &VersionId, descendant: &VersionId) -> Result<bool, PersDbError> {
        let mut queue = VecDeque::new();
        let mut seen = BTreeSet::new();
        queue.push_back(descendant.clone());
        while let Some(current) = queue.pop_front() {
            if &current == ancestor {
                return Ok(true);
            }
            if !seen.insert(current.clone()) {
                continue;
            }
            for parent in self.parents_of(&current)? {
                queue.push_back(parent);
            }
        }
        Ok(false)
    }

    fn body_of(&self, v: &VersionId) -> Result<Body, PersDbError> {
        self.get_by_version(v)?
            .map(|rev| rev.body)
            .ok_or(PersDbError::NotFound)
    }

    fn header_of(&self, v: &VersionId) -> Result<Header, PersDbError> {
        self.get_by_version(v)?
            .map(|rev| rev.header)
            .ok_or(PersDbError::NotFound)
    }

    /// Synthesizes a single virtual base body from >1 LCAs by repeatedly
    /// merging them pairwise; conflict tags produced during this synthesis
    /// propagate into the caller's final conflict set.
    fn synthesize_base(&self, lcas: &[VersionId]) -> Result<MergeOutcome, PersDbError> {
        let mut acc = self.body_of(&lcas[0])?;
        let mut conflicts = Vec::new();
        for next in &lcas[1..] {
            let next_body = self.body_of(next)?;
            // Using `acc` itself as the base treats the running synthesis as
            // the common ancestor of its own accumulated state and the next
            // LCA, which is the only meaningful base when no true common
            // ancestor between arbitrary LCAs is known.
            let outcome = merge::merge_bodies(&acc, &next_body, &acc);
            conflicts.extend(outcome.conflicts);
            acc = outcome.body;
        }
        Ok(MergeOutcome {
            body: acc,
            conflicts,
        })
    }

    /// Runs the merge algorithm of §4.5: virtual-base merge when the LCA set
    /// is empty, ordinary three-way merge for exactly one LCA, and recursive
    /// pairwise LCA synthesis for more than one.
    pub fn merge(&self, v1: &VersionId, v2: &VersionId) -> Result<Revision, PersDbError> {
        let left_body = self.body_of(v1)?;
        let right_body = self.body_of(v2)?;
        let left_header = self.header_of(v1)?;
        let right_header = self.header_of(v2)?;

        let lcas = self.lca(v1, v2)?;

        let (base_body, mut propagated_conflicts) = match lcas.as_slice() {
            [] => (Body::new(), Vec::new()),
            [single] => (self.body_of(single)?, Vec::new()),
            many => {
                let synthesized = self.synthesize_base(many)?;
                (synthesized.body, synthesized.conflicts)
            }
        };

        let outcome = merge::merge_bodies(&left_body, &right_body, &base_body);
        let mut conflicts = outcome.conflicts;
        conflicts.append(&mut propagated_conflicts);
        conflicts.sort();
        conflicts.dedup();

        let header = merge::merge_header(&left_header, &right_header, conflicts.is_empty())?;
        let header = Header {
            pa: vec![v1.clone(), v2.clone()],
            ..header
        };

        if !conflicts.is_empty() {
            return Err(PersDbError::Conflict {
                attributes: conflicts,
            });
        }

        Ok(Revision {
            header,
            body: outcome.body,
        })
    }

    /// Routes a write to the named perspective and appends it.
    pub fn write(
        &self,
        perspective: &Perspective,
        header_fields: &Body,
        body: &Body,
    ) -> Result<u64, PersDbError> {
        let tree = self.tree_for(perspective)?;
        tree.append(header_fields, body, &|v| {
            self.all_trees()
                .any(|t| !std::ptr::eq(t, tree) && t.get_by_version(v).ok().flatten().is_some())
        })
    }

    fn tree_for(&self, perspective: &Perspective) -> Result<&Tree, PersDbError> {
        match perspective {
            Perspective::Local => Ok(&self.local),
            Perspective::Stage => Ok(&self.stage),
            Perspective::Remote(name) => self
                .remotes
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, t)| t)
                .ok_or(PersDbError::NotFound),
        }
    }

    /// Aggregate stats for every perspective, keyed by a display name
    /// (`"local"`, `"stage"`, or the remote's configured name).
    pub fn stats(&self) -> Result<BTreeMap<String, TreeStats>, PersDbError> {
        let mut out = BTreeMap::new();
        out.insert("local".to_owned(), self.local.stats()?);
        out.insert("stage".to_owned(), self.stage.stats()?);
        for (name, tree) in &self.remotes {
            out.insert(name.clone(), tree.stats()?);
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;
    use crate::kv::MemStore;
    use crate::value::Value;
    use std::collections::BTreeMap as Map;

    fn header_fields(id: &str, v: &str, pa: Vec<&str>) -> Body {
        let mut b: Map<String, Value> = Map::new();
        b.insert("id".to_owned(), Value::String(id.to_owned()));
        b.insert("v".to_owned(), Value::String(v.to_owned()));
        if !pa.is_empty() {
            b.insert(
                "pa".to_owned(),
                Value::Array(pa.into_iter().map(|p| Value::String(p.to_owned())).collect()),
            );
        }
        b
    }

    fn body_of(attrs: Vec<(&str, Value)>) -> Body {
        attrs.into_iter().map(|(k, v)| (k.to_owned(), v)).collect()
    }

    fn write(mt: &MergeTree, id: &str, v: &str, pa: Vec<&str>, attrs: Vec<(&str, Value)>) {
        mt.write(&Perspective::Local, &header_fields(id, v, pa), &body_of(attrs))
            .expect("write");
    }

    fn fresh() -> MergeTree {
        MergeTree::new(Arc::new(MemStore::new()), &[])
    }

    fn vid(s: &str) -> VersionId {
        VersionId::try_from(s).expect("valid")
    }

    /// S3-style scenario: a single linear ancestor chain with one fork.
    #[test]
    fn lca_of_single_fork_is_the_fork_point() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![]);
        write(&mt, "doc-1", "B", vec!["A"], vec![]);
        write(&mt, "doc-1", "C", vec!["A"], vec![]);

        let lcas = mt.lca(&vid("B"), &vid("C")).expect("lca");
        assert_eq!(lcas, vec![vid("A")]);
    }

    #[test]
    fn lca_with_multiple_common_ancestors() {
        let mt = fresh();
        write(&mt, "doc-1", "R1", vec![], vec![]);
        write(&mt, "doc-1", "R2", vec![], vec![]);
        write(&mt, "doc-1", "L", vec!["R1", "R2"], vec![]);
        write(&mt, "doc-1", "M", vec!["R1", "R2"], vec![]);

        let mut lcas = mt.lca(&vid("L"), &vid("M")).expect("lca");
        lcas.sort();
        assert_eq!(lcas, vec![vid("R1"), vid("R2")]);
    }

    /// S4-style scenario: ordinary three-way merge through a single LCA.
    #[test]
    fn merge_through_single_lca_is_clean() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![("name", Value::String("Acme".to_owned()))]);
        write(&mt, "doc-1", "B", vec!["A"], vec![("city", Value::String("Berlin".to_owned()))]);
        write(&mt, "doc-1", "C", vec!["A"], vec![("country", Value::String("DE".to_owned()))]);

        let merged = mt.merge(&vid("B"), &vid("C")).expect("merge");
        assert_eq!(merged.header.pa, vec![vid("B"), vid("C")]);
        assert_eq!(
            merged.body.get("city"),
            Some(&Value::String("Berlin".to_owned()))
        );
        assert_eq!(
            merged.body.get("country"),
            Some(&Value::String("DE".to_owned()))
        );
    }

    #[test]
    fn merge_with_no_common_ancestor_is_virtual_base() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![("k", Value::Integer(1))]);
        write(&mt, "doc-1", "B", vec![], vec![("m", Value::Integer(2))]);

        assert!(mt.lca(&vid("A"), &vid("B")).expect("lca").is_empty());

        let merged = mt.merge(&vid("A"), &vid("B")).expect("merge");
        assert_eq!(merged.body.get("k"), Some(&Value::Integer(1)));
        assert_eq!(merged.body.get("m"), Some(&Value::Integer(2)));
    }

    #[test]
    fn merge_rejects_mismatched_ids() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![("k", Value::Integer(1))]);
        write(&mt, "doc-2", "B", vec![], vec![("k", Value::Integer(2))]);

        let merged = mt.merge(&vid("A"), &vid("B"));
        assert!(merged.is_err(), "mismatched ids must fail header construction");
    }

    #[test]
    fn merge_conflict_is_reported_as_error() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![("name", Value::String("Acme".to_owned()))]);
        write(&mt, "doc-1", "B", vec!["A"], vec![("name", Value::String("Acme Inc".to_owned()))]);
        write(&mt, "doc-1", "C", vec!["A"], vec![("name", Value::String("Acme GmbH".to_owned()))]);

        let err = mt.merge(&vid("B"), &vid("C")).unwrap_err();
        assert!(matches!(err, PersDbError::Conflict { .. }));
    }

    #[test]
    fn stats_report_each_perspective() {
        let mt = fresh();
        write(&mt, "doc-1", "A", vec![], vec![]);
        let stats = mt.stats().expect("stats");
        assert_eq!(stats.get("local").expect("local").heads_count, 1);
        assert_eq!(stats.get("stage").expect("stage").heads_count, 0);
    }
}
