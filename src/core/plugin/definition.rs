use serde::{Deserialize, Serialize};

/// Metadata a host shows for a loaded plugin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: String,
    pub author: String,
    pub description: String,
    pub version: String,
    pub url: String,
    /// Hex colour used by hosts to tag the plugin.
    pub color: String,
}

/// Fixed, per-game data. Nothing here changes between server instances.
///
/// Paths are relative to the installation root and use `/` separators;
/// URLs are plain fields so they can be redirected to a mirror.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameDefinition {
    pub full_name: String,
    /// In-game hostname template.
    pub server_name: String,
    /// Main executable, e.g. `Xonotic/xonotic-dedicated.exe`.
    pub start_path: String,
    /// Operator-owned subtree preserved across updates.
    pub data_dir: String,
    /// Plain-text file holding the installed release identifier.
    pub version_file: String,
    pub archive_prefix: String,
    pub archive_extension: String,
    /// Base URL the versioned archive is fetched from.
    pub download_base: String,
    /// Text document scanned for the newest `x.y.z` release.
    pub release_feed_url: String,
    /// Base URL of the server config template repository.
    pub config_repo_base: String,

    pub allows_embed_console: bool,
    pub port_increments: u16,
    pub default_ip: String,
    pub default_port: u16,
    pub default_query_port: u16,
    pub default_map: String,
    pub default_max_players: u32,
    pub additional_args: String,
}

impl GameDefinition {
    pub fn xonotic() -> Self {
        Self {
            full_name: "Xonotic Dedicated Server".into(),
            server_name: "Xonotic $g_xonoticversion Server".into(),
            start_path: default_start_path().into(),
            data_dir: "Xonotic/data".into(),
            version_file: "Xonotic/version.txt".into(),
            archive_prefix: "xonotic".into(),
            archive_extension: "zip".into(),
            download_base: "https://dl.xonotic.org".into(),
            release_feed_url: "https://gitlab.com/xonotic/xonotic/-/tags?format=atom".into(),
            config_repo_base: "https://github.com/Soulflare3/Game-Server-Configs/raw/master"
                .into(),
            allows_embed_console: false,
            port_increments: 1,
            default_ip: "0.0.0.0".into(),
            default_port: 26000,
            default_query_port: 26000,
            default_map: XONOTIC_MAP_LIST.into(),
            default_max_players: 8,
            additional_args: "-dedicated +serverconfig server.cfg".into(),
        }
    }

    /// `<prefix>-<version>.<ext>`, e.g. `xonotic-0.8.6.zip`.
    pub fn archive_name(&self, version: &str) -> String {
        format!(
            "{}-{}.{}",
            self.archive_prefix, version, self.archive_extension
        )
    }

    pub fn archive_url(&self, version: &str) -> String {
        format!(
            "{}/{}",
            self.download_base.trim_end_matches('/'),
            self.archive_name(version)
        )
    }
}

pub fn xonotic_plugin_info() -> PluginInfo {
    PluginInfo {
        name: "WindowsGSM.Xonotic".into(),
        author: "Soul".into(),
        description: "Xonotic Dedicated server support".into(),
        version: env!("CARGO_PKG_VERSION").into(),
        url: "https://github.com/Soulflare3/WindowsGSM.Xonotic".into(),
        color: "#7a0101".into(),
    }
}

fn default_start_path() -> &'static str {
    if cfg!(target_os = "windows") {
        "Xonotic/xonotic-dedicated.exe"
    } else {
        "Xonotic/xonotic-linux64-dedicated"
    }
}

const XONOTIC_MAP_LIST: &str = "afterslime atelier boil catharsis courtfun dance drain erbium \
finalrage fuse geoplanetary glowplant implosion leave_em_behind nexballarena oilrig runningman \
runningmanctf silentsiege solarium space-elevator stormkeep techassault vorix warfare xoylent";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn archive_name_and_url_follow_release() {
        let game = GameDefinition::xonotic();
        assert_eq!(game.archive_name("0.8.6"), "xonotic-0.8.6.zip");
        assert_eq!(
            game.archive_url("0.8.6"),
            "https://dl.xonotic.org/xonotic-0.8.6.zip"
        );
    }

    #[test]
    fn archive_url_tolerates_trailing_slash() {
        let mut game = GameDefinition::xonotic();
        game.download_base = "http://127.0.0.1:8084/host/".into();
        assert_eq!(
            game.archive_url("0.8.5"),
            "http://127.0.0.1:8084/host/xonotic-0.8.5.zip"
        );
    }
}
