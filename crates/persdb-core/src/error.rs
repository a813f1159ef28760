//! The closed application error type shared by every MergeTree operation.
//!
//! Mirrors §7's closed error-kind set exactly: every public operation in
//! this crate returns `Result<T, PersDbError>`, never a bespoke per-module
//! error type, so callers (the CLI, a future sync driver) match on one enum.
use std::fmt;

use crate::kv::StoreError;

/// One of the nine closed error kinds named by the design.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersDbError {
    /// A header failed validation (§4.2); carries the diagnostic string.
    InvalidHeader { reason: String },
    /// `append` was called with an `(id, v)` pair already present in the tree.
    Duplicate { v: String },
    /// A header's `pa` entry is not known to this tree or its fallback trees.
    UnknownParent { v: String },
    /// A lookup (`get_by_version`, etc.) found nothing.
    NotFound,
    /// Three-way merge produced an unresolvable attribute collision.
    Conflict { attributes: Vec<String> },
    /// A stream filter selector was malformed.
    SelectorError { reason: String },
    /// The underlying `OrderedStore` failed.
    IoError { detail: String },
    /// An HJSON configuration document was malformed or had unknown keys.
    ConfigError { reason: String },
    /// A credential-store operation failed.
    AuthError { reason: String },
}

impl fmt::Display for PersDbError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidHeader { reason } => write!(f, "invalid header: {reason}"),
            Self::Duplicate { v } => write!(f, "duplicate version: {v}"),
            Self::UnknownParent { v } => write!(f, "unknown parent version: {v}"),
            Self::NotFound => write!(f, "not found"),
            Self::Conflict { attributes } => {
                write!(f, "merge conflict on attributes: {}", attributes.join(", "))
            }
            Self::SelectorError { reason } => write!(f, "invalid selector: {reason}"),
            Self::IoError { detail } => write!(f, "I/O error: {detail}"),
            Self::ConfigError { reason } => write!(f, "configuration error: {reason}"),
            Self::AuthError { reason } => write!(f, "authentication error: {reason}"),
        }
    }
}

impl std::error::Error for PersDbError {}

impl From<StoreError> for PersDbError {
    fn from(e: StoreError) -> Self {
        Self::IoError {
            detail: e.to_string(),
        }
    }
}
