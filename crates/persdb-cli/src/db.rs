//! Wires a parsed [`DbConfig`] to an open [`MergeTree`], and resolves the
//! `local`/`stage`/`<perspective>` tree names used by the `log` and `compare`
//! subcommands.
use std::sync::Arc;

use persdb_core::{MemStore, MergeTree, Tree};

use crate::config::DbConfig;
use crate::error::CliError;
use crate::store;

/// An open database: the `MergeTree` view plus the backing store a caller
/// needs to persist changes back to the snapshot file.
pub struct Database {
    pub store: Arc<MemStore>,
    pub tree: MergeTree,
}

/// Opens the `MemStore` snapshot under `config`'s data directory and builds
/// the `MergeTree` over it.
pub fn open(config: &DbConfig) -> Result<Database, CliError> {
    let store = store::open(&config.data_dir())?;
    let tree = MergeTree::new(Arc::clone(&store) as Arc<dyn persdb_core::OrderedStore>, &config.remote_names());
    Ok(Database { store, tree })
}

/// Persists every tree's contents back to the snapshot file.
pub fn flush(config: &DbConfig, db: &Database) -> Result<(), CliError> {
    store::flush(&config.data_dir(), &db.store)
}

/// Resolves a tree name (`"local"`, `"stage"`, or a configured perspective
/// name) against an open `MergeTree`.
pub fn resolve_tree<'a>(mt: &'a MergeTree, name: &str) -> Result<&'a Tree, CliError> {
    match name {
        "local" => Ok(mt.local_tree()),
        "stage" => Ok(mt.stage_tree()),
        other => mt
            .remote_trees()
            .iter()
            .find(|(n, _)| n == other)
            .map(|(_, t)| t)
            .ok_or_else(|| CliError::Usage {
                reason: format!("no such perspective: {other:?}"),
            }),
    }
}
