use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::error::{ServerError, ServerResult};
use crate::core::plugin::GameDefinition;

const APP_DIR_NAME: &str = "xonotic-gsm";
const SETTINGS_FILE: &str = "settings.json";

/// Per-instance values supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerConfig {
    pub server_id: String,
    pub server_name: String,
    pub server_ip: String,
    pub server_port: u16,
    pub server_query_port: u16,
    pub server_map: String,
    pub server_max_player: u32,
    /// Raw launch arguments. Empty means the game's default arguments.
    #[serde(default)]
    pub server_param: String,
    #[serde(default)]
    pub embed_console: bool,
}

impl ServerConfig {
    /// Config for `server_id` with every other value taken from the game defaults.
    pub fn new(server_id: impl Into<String>, game: &GameDefinition) -> Self {
        Self {
            server_id: server_id.into(),
            server_name: game.server_name.clone(),
            server_ip: game.default_ip.clone(),
            server_port: game.default_port,
            server_query_port: game.default_query_port,
            server_map: game.default_map.clone(),
            server_max_player: game.default_max_players,
            server_param: String::new(),
            embed_console: game.allows_embed_console,
        }
    }

    pub fn launch_args<'a>(&'a self, game: &'a GameDefinition) -> &'a str {
        if self.server_param.trim().is_empty() {
            &game.additional_args
        } else {
            &self.server_param
        }
    }
}

/// Host-wide settings persisted as `settings.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManagerSettings {
    pub servers_root: PathBuf,
    /// Connect and read-idle timeout; a transfer that keeps moving may run longer.
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for ManagerSettings {
    fn default() -> Self {
        Self {
            servers_root: default_servers_root(),
            request_timeout_secs: default_timeout_secs(),
        }
    }
}

impl ManagerSettings {
    /// Load `settings.json` from `dir`, falling back to defaults when the file
    /// is missing or unreadable.
    pub fn load(dir: &Path) -> Self {
        let path = dir.join(SETTINGS_FILE);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(_) => return Self::default(),
        };
        match serde_json::from_str(&raw) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Corrupt settings at {:?}, using defaults: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save(&self, dir: &Path) -> ServerResult<()> {
        std::fs::create_dir_all(dir).map_err(|e| ServerError::io(dir, e))?;
        let path = dir.join(SETTINGS_FILE);
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json).map_err(|e| ServerError::io(path, e))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_servers_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("servers")
}
