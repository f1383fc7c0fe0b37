use std::path::{Path, PathBuf};
use thiserror::Error;

/// Central error type for the server lifecycle backend.
/// Every module returns `Result<T, ServerError>`.
#[derive(Debug, Error)]
pub enum ServerError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Request to {url} failed: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    // ── Versions ────────────────────────────────────────
    #[error("No release version found in {source_name}")]
    VersionParse { source_name: String },

    #[error("{start_path} is missing ({executable:?})")]
    NotInstalled {
        start_path: String,
        executable: PathBuf,
    },

    // ── Install ─────────────────────────────────────────
    #[error("Fail to download {archive}: {source}")]
    Download {
        archive: String,
        #[source]
        source: Box<ServerError>,
    },

    #[error("Fail to extract {archive:?}: {source}")]
    Extract {
        archive: PathBuf,
        #[source]
        source: Box<ServerError>,
    },

    #[error("Install failed: {source}")]
    Install {
        #[source]
        source: Box<ServerError>,
    },

    #[error("Installation is not valid: {reason}")]
    Validation { reason: String },

    // ── Update / data guard ─────────────────────────────
    #[error("Fail to back up {data_dir:?} into {temp_dir:?}: {source}")]
    Backup {
        data_dir: PathBuf,
        temp_dir: PathBuf,
        #[source]
        source: Box<ServerError>,
    },

    #[error("Fail to delete the stale backup folder {temp_dir:?}: {source}")]
    Cleanup {
        temp_dir: PathBuf,
        source: std::io::Error,
    },

    #[error("Fail to delete the serverfiles at {root:?}: {source}{}", backup_hint(.backup))]
    Wipe {
        root: PathBuf,
        backup: Option<PathBuf>,
        source: std::io::Error,
    },

    #[error(
        "Fail to restore user data into {data_dir:?}: {source}. \
         The data is still in {temp_dir:?}, copy it back manually"
    )]
    Restore {
        temp_dir: PathBuf,
        data_dir: PathBuf,
        #[source]
        source: Box<ServerError>,
    },

    // ── Process ─────────────────────────────────────────
    #[error("{name} not found ({path:?})")]
    ExecutableNotFound { name: String, path: PathBuf },

    #[error("Process error: {0}")]
    Process(String),

    #[error("Another install or update is already running for server {0}")]
    OperationInProgress(String),

    // ── Formats ─────────────────────────────────────────
    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type ServerResult<T> = Result<T, ServerError>;

impl ServerError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ServerError::Io {
            path: path.into(),
            source,
        }
    }

    /// Location of the backup that now holds the only copy of the user data,
    /// if this failure left it stranded there.
    pub fn stranded_backup(&self) -> Option<&Path> {
        match self {
            ServerError::Restore { temp_dir, .. } => Some(temp_dir),
            ServerError::Wipe {
                backup: Some(backup),
                ..
            } => Some(backup),
            _ => None,
        }
    }
}

fn backup_hint(backup: &Option<PathBuf>) -> String {
    match backup {
        Some(path) => format!(". User data backup kept at {path:?}"),
        None => String::new(),
    }
}

impl From<std::io::Error> for ServerError {
    fn from(source: std::io::Error) -> Self {
        ServerError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

// Hosts forward errors over their own IPC as plain text.
impl serde::Serialize for ServerError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_failure_names_backup_location() {
        let err = ServerError::Restore {
            temp_dir: PathBuf::from("/srv/1/__temp"),
            data_dir: PathBuf::from("/srv/1/serverfiles/Xonotic/data"),
            source: Box::new(ServerError::Other("disk full".into())),
        };
        assert!(err.to_string().contains("__temp"));
        assert_eq!(err.stranded_backup(), Some(Path::new("/srv/1/__temp")));
    }

    #[test]
    fn wipe_without_backup_strands_nothing() {
        let err = ServerError::Wipe {
            root: PathBuf::from("/srv/1/serverfiles"),
            backup: None,
            source: std::io::Error::other("busy"),
        };
        assert!(err.stranded_backup().is_none());
        assert!(!err.to_string().contains("backup kept"));
    }

    #[test]
    fn serializes_as_display_text() {
        let err = ServerError::OperationInProgress("7".into());
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(
            json,
            "\"Another install or update is already running for server 7\""
        );
    }
}
