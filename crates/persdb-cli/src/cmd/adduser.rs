//! `persdb adduser` - register a user in the credential store (§6).
use std::path::{Path, PathBuf};

use crate::error::CliError;

fn default_credential_file() -> PathBuf {
    PathBuf::from("./credentials")
}

pub fn run(username: Option<String>, write: Option<PathBuf>) -> Result<(), CliError> {
    let username = match username {
        Some(u) => u,
        None => rpassword::prompt_password("username: ").map_err(|e| CliError::IoError {
            source: "stdin".to_owned(),
            detail: e.to_string(),
        })?,
    };

    let password = rpassword::prompt_password("password: ").map_err(|e| CliError::IoError {
        source: "stdin".to_owned(),
        detail: e.to_string(),
    })?;
    let confirm = rpassword::prompt_password("password (again): ").map_err(|e| CliError::IoError {
        source: "stdin".to_owned(),
        detail: e.to_string(),
    })?;
    if password != confirm {
        return Err(CliError::Usage {
            reason: "passwords did not match".to_owned(),
        });
    }

    let path = write.unwrap_or_else(default_credential_file);
    let hash = register(&path, &username, &password)?;
    println!("{username}:{hash}");
    Ok(())
}

fn register(path: &Path, username: &str, password: &str) -> Result<String, CliError> {
    persdb_auth::register(path, username, password).map_err(CliError::from)
}
