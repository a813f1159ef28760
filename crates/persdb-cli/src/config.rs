//! HJSON database configuration (§6): parsed into a closed struct so an
//! unknown key is a type error rather than a hand-written check.
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CliError;

fn default_chroot() -> PathBuf {
    PathBuf::from("/var/persdb")
}

fn default_data() -> PathBuf {
    PathBuf::from("data")
}

/// One configured perspective (peer) this database knows how to sync with.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PerspectiveConfig {
    pub name: String,
    #[serde(default)]
    pub connect: Option<String>,
    #[serde(default)]
    pub import: Option<bool>,
    #[serde(default)]
    pub export: Option<bool>,
}

/// A database entry as described in §6. Any key outside this shape is a
/// fatal configuration error by construction.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DbConfig {
    pub name: String,
    #[serde(default = "default_chroot")]
    pub chroot: PathBuf,
    #[serde(default = "default_data")]
    pub data: PathBuf,
    #[serde(default)]
    pub perspectives: Vec<PerspectiveConfig>,
}

impl DbConfig {
    /// The on-disk directory this database's KV store snapshot lives under.
    pub fn data_dir(&self) -> PathBuf {
        self.chroot.join(&self.data)
    }

    pub fn remote_names(&self) -> Vec<String> {
        self.perspectives.iter().map(|p| p.name.clone()).collect()
    }
}

/// Reads and parses an HJSON config document from `path`.
pub fn load(path: &Path) -> Result<DbConfig, CliError> {
    let text = std::fs::read_to_string(path).map_err(|e| CliError::IoError {
        source: path.display().to_string(),
        detail: e.to_string(),
    })?;
    deser_hjson::from_str(&text).map_err(|e| CliError::Core(crate::error::core_config_error(e.to_string())))
}
