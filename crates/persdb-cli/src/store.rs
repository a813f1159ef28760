//! Local single-process persistence for a [`MergeTree`]'s [`OrderedStore`].
//!
//! `persdb-core` states the `OrderedStore` contract and ships `MemStore`, an
//! in-memory reference implementation, but says nothing about durability - a
//! real LSM-class engine is explicitly out of scope for the core crate (see
//! `kv.rs`'s module doc). The CLI is a single-process, single-invocation
//! tool, so it closes that gap the simplest way that still round-trips
//! exactly: load the whole keyspace from a snapshot file into a `MemStore` at
//! startup, run the command, and write the whole keyspace back out if it
//! changed. The snapshot uses the same canonical CBOR encoding as revisions.
use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use persdb_core::{MemStore, OrderedStore};
use serde::{Deserialize, Serialize};

use crate::error::CliError;

#[derive(Serialize, Deserialize)]
struct Entry {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Opens the snapshot file at `dir/snapshot.cbor`, loading it into a fresh
/// `MemStore`. A missing snapshot is treated as an empty store.
pub fn open(dir: &Path) -> Result<Arc<MemStore>, CliError> {
    let store = MemStore::new();
    let path = snapshot_path(dir);
    let bytes = match std::fs::read(&path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Arc::new(store)),
        Err(e) => {
            return Err(CliError::IoError {
                source: path.display().to_string(),
                detail: e.to_string(),
            });
        }
    };

    let entries: Vec<Entry> = persdb_core::decode_cbor(&bytes).map_err(|e| CliError::IoError {
        source: path.display().to_string(),
        detail: e.to_string(),
    })?;

    let mut batch = persdb_core::kv::WriteBatch::new();
    for entry in entries {
        batch.put(entry.key, entry.value);
    }
    if !batch.is_empty() {
        store.write_batch(batch).map_err(|e| CliError::IoError {
            source: path.display().to_string(),
            detail: e.to_string(),
        })?;
    }
    Ok(Arc::new(store))
}

/// Writes every key in `store` back to `dir/snapshot.cbor`.
pub fn flush(dir: &Path, store: &MemStore) -> Result<(), CliError> {
    std::fs::create_dir_all(dir).map_err(|e| CliError::IoError {
        source: dir.display().to_string(),
        detail: e.to_string(),
    })?;

    let entries: Vec<Entry> = store
        .range(Bound::Unbounded, Bound::Unbounded, false)
        .map_err(|e| CliError::IoError {
            source: dir.display().to_string(),
            detail: e.to_string(),
        })?
        .map(|(key, value)| Entry { key, value })
        .collect();

    let bytes = persdb_core::encode_cbor(&entries).map_err(|e| CliError::IoError {
        source: dir.display().to_string(),
        detail: e.to_string(),
    })?;

    let path = snapshot_path(dir);
    std::fs::write(&path, bytes).map_err(|e| CliError::IoError {
        source: path.display().to_string(),
        detail: e.to_string(),
    })
}

fn snapshot_path(dir: &Path) -> PathBuf {
    dir.join("snapshot.cbor")
}
