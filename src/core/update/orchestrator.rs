// ─── Update Orchestrator ───
// Snapshot user data, wipe the installation root, reinstall, restore, validate.
//
// Nothing under the installation root is deleted until the snapshot has
// succeeded (or there was nothing to snapshot). Once the root is wiped the
// backup is the only copy of the user data, so every later failure either
// restores it or reports where it is.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, error, info, instrument};

use crate::core::backup::DataGuard;
use crate::core::error::{ServerError, ServerResult};
use crate::core::install::ReleaseInstaller;

/// Where an update currently is. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStage {
    Idle,
    BackingUp,
    Wiping,
    Reinstalling,
    Restoring,
    Validating,
    Done,
    Failed,
}

impl fmt::Display for UpdateStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UpdateStage::Idle => "idle",
            UpdateStage::BackingUp => "backing-up",
            UpdateStage::Wiping => "wiping",
            UpdateStage::Reinstalling => "reinstalling",
            UpdateStage::Restoring => "restoring",
            UpdateStage::Validating => "validating",
            UpdateStage::Done => "done",
            UpdateStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// One data-preserving update of one installation root.
pub struct UpdateOrchestrator<'a, I: ReleaseInstaller + ?Sized> {
    installer: &'a I,
    guard: DataGuard,
    install_root: PathBuf,
}

impl<'a, I: ReleaseInstaller + ?Sized> UpdateOrchestrator<'a, I> {
    pub fn new(installer: &'a I, guard: DataGuard, install_root: PathBuf) -> Self {
        Self {
            installer,
            guard,
            install_root,
        }
    }

    #[instrument(skip(self), fields(root = ?self.install_root))]
    pub async fn run(&self) -> ServerResult<()> {
        let mut stage = UpdateStage::Idle;
        let result = self.drive(&mut stage).await;
        match &result {
            Ok(()) => advance(&mut stage, UpdateStage::Done),
            Err(e) => {
                error!("Update failed while {}: {}", stage, e);
                if let Some(backup) = e.stranded_backup() {
                    error!("User data is only in {:?}, recover it manually", backup);
                }
                advance(&mut stage, UpdateStage::Failed);
            }
        }
        result
    }

    async fn drive(&self, stage: &mut UpdateStage) -> ServerResult<()> {
        advance(stage, UpdateStage::BackingUp);
        let backed_up = self.guard.snapshot().await?;

        advance(stage, UpdateStage::Wiping);
        self.wipe(backed_up).await?;

        advance(stage, UpdateStage::Reinstalling);
        let installed = self.installer.install().await;
        if let Err(e) = &installed {
            error!("Reinstall failed: {}", e);
        }

        // Restore even after a failed reinstall; the backup must not be
        // abandoned because the download or extraction broke.
        if backed_up {
            advance(stage, UpdateStage::Restoring);
            if let Err(restore_err) = self.guard.restore().await {
                if let Err(install_err) = &installed {
                    error!("Restore failed after reinstall error: {}", install_err);
                }
                return Err(restore_err);
            }
        }

        let version = installed.map_err(|e| ServerError::Install {
            source: Box::new(e),
        })?;

        advance(stage, UpdateStage::Validating);
        if !self.installer.validate() {
            return Err(ServerError::Validation {
                reason: format!(
                    "start executable missing after installing {} into {:?}",
                    version, self.install_root
                ),
            });
        }

        info!("Updated to {}", version);
        Ok(())
    }

    /// Delete the installation root and recreate it empty.
    async fn wipe(&self, backed_up: bool) -> ServerResult<()> {
        self.installer
            .reset_root(&self.install_root)
            .await
            .map_err(|source| ServerError::Wipe {
                root: self.install_root.clone(),
                backup: backed_up.then(|| self.guard.temp_dir().to_path_buf()),
                source,
            })
    }
}

fn advance(stage: &mut UpdateStage, next: UpdateStage) {
    debug!("Update stage {} -> {}", stage, next);
    *stage = next;
}
