use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{info, instrument, warn};

use crate::core::archive;
use crate::core::downloader::{Downloader, ProgressReporter};
use crate::core::error::{ServerError, ServerResult};
use crate::core::paths::ServerPaths;
use crate::core::plugin::GameDefinition;
use crate::core::version::{Version, VersionResolver};

/// Anything that can lay a release down into the installation root.
#[async_trait]
pub trait ReleaseInstaller: Send + Sync {
    /// Install the latest release, returning the version now recorded.
    async fn install(&self) -> ServerResult<Version>;

    /// Whether the installation root holds a usable server.
    fn validate(&self) -> bool;

    /// Delete `root` and recreate it empty before a reinstall.
    async fn reset_root(&self, root: &Path) -> std::io::Result<()> {
        if tokio::fs::try_exists(root).await? {
            tokio::fs::remove_dir_all(root).await?;
        }
        tokio::fs::create_dir_all(root).await
    }
}

/// Downloads `<prefix>-<version>.<ext>` and unpacks it into the install root.
pub struct ArchiveInstaller {
    game: GameDefinition,
    paths: ServerPaths,
    resolver: VersionResolver,
    downloader: Downloader,
}

impl ArchiveInstaller {
    pub fn new(client: Client, game: GameDefinition, paths: ServerPaths) -> Self {
        let resolver = VersionResolver::new(client.clone(), &game, &paths);
        Self {
            game,
            paths,
            resolver,
            downloader: Downloader::new(client),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.downloader = self.downloader.with_reporter(reporter);
        self
    }

    pub fn resolver(&self) -> &VersionResolver {
        &self.resolver
    }

    /// True iff the start executable exists under `root`.
    pub fn executable_exists_in(&self, root: &Path) -> bool {
        crate::core::paths::join_relative(root, &self.game.start_path).exists()
    }
}

#[async_trait]
impl ReleaseInstaller for ArchiveInstaller {
    #[instrument(skip(self), fields(root = ?self.paths.install_root()))]
    async fn install(&self) -> ServerResult<Version> {
        let version = self.resolver.resolve_remote_version().await?;

        let archive_name = self.game.archive_name(version.as_str());
        let address = self.game.archive_url(version.as_str());
        let archive_path = self.paths.archive_path(&self.game, version.as_str());

        let download_start = Instant::now();
        self.downloader
            .download_file(&address, &archive_path)
            .await
            .map_err(|e| ServerError::Download {
                archive: archive_name.clone(),
                source: Box::new(e),
            })?;
        info!("Downloaded {} in {:?}", archive_name, download_start.elapsed());

        let extract_start = Instant::now();
        // The archive stays on disk after a failed extraction for inspection.
        archive::extract_zip(&archive_path, self.paths.install_root())
            .await
            .map_err(|e| ServerError::Extract {
                archive: archive_path.clone(),
                source: Box::new(e),
            })?;
        info!("Extracted {} in {:?}", archive_name, extract_start.elapsed());

        self.resolver.write_local_version(&version).await?;

        if let Err(e) = tokio::fs::remove_file(&archive_path).await {
            warn!("Leaving {:?} behind, cannot delete it: {}", archive_path, e);
        }

        info!("Installed {} {}", self.game.full_name, version);
        Ok(version)
    }

    fn validate(&self) -> bool {
        self.paths.executable(&self.game).exists()
    }
}
