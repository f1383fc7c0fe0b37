use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{info, instrument};

use super::contract::GameServerPlugin;
use super::definition::{xonotic_plugin_info, GameDefinition, PluginInfo};
use crate::core::backup::DataGuard;
use crate::core::downloader::ProgressReporter;
use crate::core::error::{ServerError, ServerResult};
use crate::core::http::build_http_client;
use crate::core::install::{ArchiveInstaller, ReleaseInstaller};
use crate::core::paths::ServerPaths;
use crate::core::process::{ProcessSupervisor, ServerProcess};
use crate::core::settings::{ManagerSettings, ServerConfig};
use crate::core::template::ConfigTemplater;
use crate::core::update::UpdateOrchestrator;
use crate::core::version::Version;

/// One Xonotic dedicated server instance.
///
/// Install and update are serialized per instance: a second call while one
/// is running fails with `OperationInProgress`.
pub struct XonoticServer {
    info: PluginInfo,
    game: GameDefinition,
    config: ServerConfig,
    paths: ServerPaths,
    installer: ArchiveInstaller,
    templater: ConfigTemplater,
    supervisor: ProcessSupervisor,
    operation: Mutex<()>,
}

impl XonoticServer {
    pub fn new(config: ServerConfig, settings: &ManagerSettings) -> ServerResult<Self> {
        let client = build_http_client(settings.request_timeout())?;
        Ok(Self::with_parts(
            config,
            GameDefinition::xonotic(),
            &settings.servers_root,
            client,
        ))
    }

    pub fn with_parts(
        config: ServerConfig,
        game: GameDefinition,
        servers_root: &Path,
        client: Client,
    ) -> Self {
        let paths = ServerPaths::new(servers_root, &config.server_id);
        let installer = ArchiveInstaller::new(client.clone(), game.clone(), paths.clone());
        let templater = ConfigTemplater::new(client, game.config_repo_base.clone());
        Self {
            info: xonotic_plugin_info(),
            game,
            config,
            paths,
            installer,
            templater,
            supervisor: ProcessSupervisor::new(),
            operation: Mutex::new(()),
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.installer = self.installer.with_reporter(reporter);
        self
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn paths(&self) -> &ServerPaths {
        &self.paths
    }

    fn begin_operation(&self) -> ServerResult<MutexGuard<'_, ()>> {
        self.operation
            .try_lock()
            .map_err(|_| ServerError::OperationInProgress(self.config.server_id.clone()))
    }

    fn cfg_replacements(&self) -> Vec<(String, String)> {
        vec![
            ("{{ServerName}}".into(), self.config.server_name.clone()),
            (
                "{{MaxClients}}".into(),
                self.config.server_max_player.to_string(),
            ),
            ("{{IP}}".into(), self.config.server_ip.clone()),
            ("{{Port}}".into(), self.config.server_port.to_string()),
            ("{{DefaultMap}}".into(), self.config.server_map.clone()),
        ]
    }
}

#[async_trait]
impl GameServerPlugin for XonoticServer {
    fn info(&self) -> &PluginInfo {
        &self.info
    }

    fn definition(&self) -> &GameDefinition {
        &self.game
    }

    #[instrument(skip(self), fields(server = %self.config.server_id))]
    async fn install(&self) -> ServerResult<()> {
        let _operation = self.begin_operation()?;
        self.installer.install().await?;
        Ok(())
    }

    #[instrument(skip(self), fields(server = %self.config.server_id))]
    async fn update(&self) -> ServerResult<()> {
        let _operation = self.begin_operation()?;
        let guard = DataGuard::new(
            self.paths.data_dir(&self.game),
            self.paths.temp_backup_dir(),
        );
        UpdateOrchestrator::new(&self.installer, guard, self.paths.install_root().to_path_buf())
            .run()
            .await
    }

    fn is_install_valid(&self) -> bool {
        self.installer.validate()
    }

    fn is_import_valid(&self, path: &Path) -> ServerResult<()> {
        if self.installer.executable_exists_in(path) {
            Ok(())
        } else {
            Err(ServerError::Validation {
                reason: format!("Invalid Path! Fail to find {}", self.game.start_path),
            })
        }
    }

    async fn local_build(&self) -> ServerResult<Version> {
        self.installer.resolver().read_local_version().await
    }

    async fn remote_build(&self) -> ServerResult<Version> {
        self.installer.resolver().resolve_remote_version().await
    }

    async fn create_server_cfg(&self) -> ServerResult<()> {
        let target = self.paths.data_dir(&self.game).join("server.cfg");
        self.templater
            .apply(&target, &self.game.full_name, &self.cfg_replacements())
            .await
    }

    fn start(&self) -> ServerResult<ServerProcess> {
        let executable = self.paths.executable(&self.game);
        let capture = self.config.embed_console && self.game.allows_embed_console;
        info!(
            "Starting {} ({})",
            self.game.full_name, self.config.server_id
        );
        self.supervisor.start(
            &executable,
            None,
            self.config.launch_args(&self.game),
            capture,
        )
    }

    async fn stop(&self, process: &mut ServerProcess) -> ServerResult<()> {
        self.supervisor.stop(process).await
    }
}
