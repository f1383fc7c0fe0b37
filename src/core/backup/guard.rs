// ─── Data Guard ───
// Keeps the operator's data subtree alive across a wipe-and-reinstall.

use std::path::{Path, PathBuf};

use tracing::{info, instrument, warn};

use super::copy::copy_dir;
use crate::core::error::{ServerError, ServerResult};

/// Snapshot/restore pair for one data directory and its backup location.
#[derive(Debug, Clone)]
pub struct DataGuard {
    data_dir: PathBuf,
    temp_dir: PathBuf,
}

impl DataGuard {
    pub fn new(data_dir: PathBuf, temp_dir: PathBuf) -> Self {
        Self { data_dir, temp_dir }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub async fn data_exists(&self) -> bool {
        is_dir(&self.data_dir).await
    }

    /// Copy the data directory into the backup location.
    ///
    /// Returns `false` without touching anything when there is no data
    /// directory. A leftover backup from an earlier run is deleted first; if
    /// that fails the snapshot fails rather than mixing old and new data.
    #[instrument(skip(self), fields(data = ?self.data_dir, temp = ?self.temp_dir))]
    pub async fn snapshot(&self) -> ServerResult<bool> {
        if !self.data_exists().await {
            info!("No data directory, nothing to back up");
            return Ok(false);
        }

        // An unreadable backup path is left for the copy below to report.
        if tokio::fs::try_exists(&self.temp_dir).await.unwrap_or(false) {
            warn!("Removing stale backup at {:?}", self.temp_dir);
            tokio::fs::remove_dir_all(&self.temp_dir)
                .await
                .map_err(|source| ServerError::Cleanup {
                    temp_dir: self.temp_dir.clone(),
                    source,
                })?;
        }

        copy_dir(&self.data_dir, &self.temp_dir, true)
            .await
            .map_err(|e| ServerError::Backup {
                data_dir: self.data_dir.clone(),
                temp_dir: self.temp_dir.clone(),
                source: Box::new(e),
            })?;

        info!("Backed up user data");
        Ok(true)
    }

    /// Copy the backup back over the data directory, then delete the backup.
    ///
    /// On failure the backup is left in place: it is now the only copy of
    /// the user data.
    #[instrument(skip(self), fields(data = ?self.data_dir, temp = ?self.temp_dir))]
    pub async fn restore(&self) -> ServerResult<()> {
        if !is_dir(&self.temp_dir).await {
            warn!("Backup {:?} is missing, nothing to restore", self.temp_dir);
            return Ok(());
        }

        copy_dir(&self.temp_dir, &self.data_dir, true)
            .await
            .map_err(|e| ServerError::Restore {
                temp_dir: self.temp_dir.clone(),
                data_dir: self.data_dir.clone(),
                source: Box::new(e),
            })?;

        if let Err(e) = tokio::fs::remove_dir_all(&self.temp_dir).await {
            warn!("Restored data but cannot delete backup {:?}: {}", self.temp_dir, e);
        }

        info!("Restored user data");
        Ok(())
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}
