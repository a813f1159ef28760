//! CLI error type with associated exit codes (§6/§7).
//!
//! [`CliError`] wraps `persdb_core::PersDbError` and adds the local I/O and
//! usage variants that only make sense at the process boundary. Every
//! variant maps to one of the closed exit codes via [`CliError::exit_code`]:
//! 0 success (not a variant here), 1 usage/permission, 2 I/O or data error,
//! 3 credential operation failed. Exit code 143 (SIGTERM) and 8 (IPC misuse)
//! are not raised by any variant below; they are reserved by §6 for signal
//! delivery and a future child-process sync driver.
use std::fmt;
use std::path::PathBuf;

use persdb_auth::AuthError;
use persdb_core::PersDbError;

#[derive(Debug)]
pub enum CliError {
    /// A domain error from `persdb-core`.
    Core(PersDbError),
    /// A credential-store error from `persdb-auth`.
    Auth(AuthError),
    /// A file argument could not be found.
    FileNotFound { path: PathBuf },
    /// The process lacks permission to read or write a path.
    PermissionDenied { path: PathBuf },
    /// A generic I/O error not covered by the more specific variants above.
    IoError { source: String, detail: String },
    /// The command-line arguments were well-formed but semantically invalid
    /// (e.g. a `compare` invocation naming a perspective that doesn't exist).
    Usage { reason: String },
}

pub fn core_config_error(reason: String) -> PersDbError {
    PersDbError::ConfigError { reason }
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage { .. } | Self::PermissionDenied { .. } => 1,
            Self::Auth(_) => 3,
            Self::Core(e) => match e {
                PersDbError::AuthError { .. } => 3,
                _ => 2,
            },
            Self::FileNotFound { .. } | Self::IoError { .. } => 2,
        }
    }

    pub fn message(&self) -> String {
        match self {
            Self::Core(e) => format!("error: {e}"),
            Self::Auth(e) => format!("error: {e}"),
            Self::FileNotFound { path } => format!("error: file not found: {}", path.display()),
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error reading {source}: {detail}")
            }
            Self::Usage { reason } => format!("error: {reason}"),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

impl From<PersDbError> for CliError {
    fn from(e: PersDbError) -> Self {
        Self::Core(e)
    }
}

impl From<AuthError> for CliError {
    fn from(e: AuthError) -> Self {
        Self::Auth(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_error_is_exit_3() {
        let e = CliError::Core(PersDbError::AuthError {
            reason: "bad hash".to_owned(),
        });
        assert_eq!(e.exit_code(), 3);
    }

    #[test]
    fn config_error_is_exit_2() {
        let e = CliError::Core(PersDbError::ConfigError {
            reason: "unknown key".to_owned(),
        });
        assert_eq!(e.exit_code(), 2);
    }

    #[test]
    fn usage_error_is_exit_1() {
        let e = CliError::Usage {
            reason: "no such perspective".to_owned(),
        };
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn permission_denied_is_exit_1() {
        let e = CliError::PermissionDenied {
            path: PathBuf::from("/etc/shadow"),
        };
        assert_eq!(e.exit_code(), 1);
    }

    #[test]
    fn file_not_found_is_exit_2() {
        let e = CliError::FileNotFound {
            path: PathBuf::from("missing.hjson"),
        };
        assert_eq!(e.exit_code(), 2);
    }

    #[test]
    fn display_matches_message() {
        let e = CliError::Usage {
            reason: "bad args".to_owned(),
        };
        assert_eq!(format!("{e}"), e.message());
    }
}
