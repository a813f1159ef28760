//! Error type for credential-file operations.
use std::path::PathBuf;

use thiserror::Error;

/// All error conditions the credential store can produce.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("username must be 1..128 bytes, got {len}")]
    InvalidUsername { len: usize },

    #[error("password must be 1..256 bytes, got {len}")]
    InvalidPassword { len: usize },

    #[error("username already registered: {username}")]
    UsernameExists { username: String },

    #[error("no such user: {username}")]
    UnknownUser { username: String },

    #[error("malformed credential line {line_no} in {path}")]
    MalformedLine { path: PathBuf, line_no: usize },

    #[error("bcrypt failure: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}
