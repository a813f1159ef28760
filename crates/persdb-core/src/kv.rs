//! The ordered key-value store contract and an in-memory reference impl.
//!
//! The real store (a LevelDB-class LSM engine) is external to this crate;
//! [`OrderedStore`] states only the contract a `Tree` needs: point get,
//! ascending/descending range scan with a snapshot taken at call time, and
//! an atomic batch write. [`MemStore`] is a `BTreeMap`-backed implementation
//! used by every test in this workspace and by the CLI for local,
//! single-process operation.
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Bound;
use std::sync::RwLock;

/// Error surfaced by an [`OrderedStore`] implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError(pub String);

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "store error: {}", self.0)
    }
}

impl std::error::Error for StoreError {}

/// A single mutation within a [`WriteBatch`].
#[derive(Debug, Clone)]
pub enum BatchOp {
    Put(Vec<u8>, Vec<u8>),
    Delete(Vec<u8>),
}

/// An ordered list of mutations applied atomically by [`OrderedStore::write_batch`].
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Put(key, value));
        self
    }

    pub fn delete(&mut self, key: Vec<u8>) -> &mut Self {
        self.ops.push(BatchOp::Delete(key));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// An ordered, byte-keyed key-value store.
///
/// Implementations must guarantee that `range` observes a snapshot taken at
/// the moment it is called: writes that land after the iterator is created
/// are never observed by that iterator, matching §5's ordering guarantees.
pub trait OrderedStore: Send + Sync {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Range scan over `[start, end)`, ascending unless `reverse` is set.
    fn range(
        &self,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
        reverse: bool,
    ) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + Send>, StoreError>;

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// `BTreeMap`-backed [`OrderedStore`] used for tests and single-process use.
#[derive(Default)]
pub struct MemStore {
    inner: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl OrderedStore for MemStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError("lock poisoned".to_owned()))?;
        Ok(guard.get(key).cloned())
    }

    fn range(
        &self,
        start: Bound<Vec<u8>>,
        end: Bound<Vec<u8>>,
        reverse: bool,
    ) -> Result<Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + Send>, StoreError> {
        let guard = self
            .inner
            .read()
            .map_err(|_| StoreError("lock poisoned".to_owned()))?;
        // Snapshot: clone the matching slice now, so later writes to `inner`
        // are invisible to the returned iterator.
        let mut items: Vec<(Vec<u8>, Vec<u8>)> = guard
            .range((start, end))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        if reverse {
            items.reverse();
        }
        Ok(Box::new(items.into_iter()))
    }

    fn write_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| StoreError("lock poisoned".to_owned()))?;
        for op in batch.ops {
            match op {
                BatchOp::Put(k, v) => {
                    guard.insert(k, v);
                }
                BatchOp::Delete(k) => {
                    guard.remove(&k);
                }
            }
        }
        Ok(())
    }
}
