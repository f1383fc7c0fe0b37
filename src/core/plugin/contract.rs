use std::path::Path;

use async_trait::async_trait;

use super::definition::{GameDefinition, PluginInfo};
use crate::core::error::ServerResult;
use crate::core::process::ServerProcess;
use crate::core::version::Version;

/// What a server manager host needs from a game plugin.
///
/// Success carries no payload; any failure comes back as a `ServerError`.
#[async_trait]
pub trait GameServerPlugin: Send + Sync {
    fn info(&self) -> &PluginInfo;

    fn definition(&self) -> &GameDefinition;

    /// Fresh install of the latest release. No user data is preserved.
    async fn install(&self) -> ServerResult<()>;

    /// Wipe and reinstall, keeping the user data directory.
    async fn update(&self) -> ServerResult<()>;

    fn is_install_valid(&self) -> bool;

    /// Whether `path` holds an existing installation that can be adopted.
    fn is_import_valid(&self, path: &Path) -> ServerResult<()>;

    async fn local_build(&self) -> ServerResult<Version>;

    async fn remote_build(&self) -> ServerResult<Version>;

    /// Write the default server config into the data directory.
    async fn create_server_cfg(&self) -> ServerResult<()>;

    fn start(&self) -> ServerResult<ServerProcess>;

    async fn stop(&self, process: &mut ServerProcess) -> ServerResult<()>;
}
