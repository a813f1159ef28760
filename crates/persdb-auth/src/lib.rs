//! Credential store for PerspectiveDB (§4.8): a flat `username:bcrypt_hash`
//! file, one entry per line, rewritten atomically on every registration.
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use bcrypt::DEFAULT_COST;

pub mod error;

pub use error::AuthError;

const MAX_USERNAME_LEN: usize = 128;
const MAX_PASSWORD_LEN: usize = 256;

fn validate_username(username: &str) -> Result<(), AuthError> {
    let len = username.len();
    if len == 0 || len > MAX_USERNAME_LEN || username.contains(':') || username.contains('\n') {
        return Err(AuthError::InvalidUsername { len });
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.len();
    if len == 0 || len > MAX_PASSWORD_LEN {
        return Err(AuthError::InvalidPassword { len });
    }
    Ok(())
}

/// Reads every `username:bcrypt_hash` entry from `path`. A missing file is
/// treated as an empty credential store.
fn read_entries(path: &Path) -> Result<BTreeMap<String, String>, AuthError> {
    let mut entries = BTreeMap::new();
    let contents = match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(entries),
        Err(e) => {
            return Err(AuthError::Io {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };

    for (line_no, line) in contents.lines().enumerate() {
        if line.is_empty() {
            continue;
        }
        let (user, hash) = line.split_once(':').ok_or_else(|| AuthError::MalformedLine {
            path: path.to_path_buf(),
            line_no: line_no + 1,
        })?;
        entries.insert(user.to_owned(), hash.to_owned());
    }
    Ok(entries)
}

/// Writes `entries` to `path` atomically: the full contents are written to a
/// sibling temp file first, then renamed over `path`.
fn write_entries_atomically(path: &Path, entries: &BTreeMap<String, String>) -> Result<(), AuthError> {
    let mut body = String::new();
    for (user, hash) in entries {
        body.push_str(user);
        body.push(':');
        body.push_str(hash);
        body.push('\n');
    }

    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, body).map_err(|e| AuthError::Io {
        path: tmp_path.clone(),
        source: e,
    })?;
    fs::rename(&tmp_path, path).map_err(|e| AuthError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "credentials".to_owned());
    name.push_str(&format!(".tmp.{}", std::process::id()));
    path.with_file_name(name)
}

/// Registers `username` with a freshly bcrypt-hashed `password`, appending to
/// the credential file at `path`. Rejects a username already present.
pub fn register(path: &Path, username: &str, password: &str) -> Result<String, AuthError> {
    validate_username(username)?;
    validate_password(password)?;

    let mut entries = read_entries(path)?;
    if entries.contains_key(username) {
        return Err(AuthError::UsernameExists {
            username: username.to_owned(),
        });
    }

    let hash = bcrypt::hash(password, DEFAULT_COST)?;
    entries.insert(username.to_owned(), hash.clone());
    write_entries_atomically(path, &entries)?;
    Ok(hash)
}

/// Verifies `password` against the stored hash for `username`.
pub fn verify(path: &Path, username: &str, password: &str) -> Result<bool, AuthError> {
    let entries = read_entries(path)?;
    let hash = entries.get(username).ok_or_else(|| AuthError::UnknownUser {
        username: username.to_owned(),
    })?;
    Ok(bcrypt::verify(password, hash)?)
}
