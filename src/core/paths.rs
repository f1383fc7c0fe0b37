use std::path::{Path, PathBuf};

use super::plugin::GameDefinition;

const SERVER_FILES_DIR: &str = "serverfiles";
const TEMP_BACKUP_DIR: &str = "__temp";

/// Filesystem layout of one server instance.
///
/// ```text
/// <servers_root>/<id>/
///   serverfiles/          installation root, wiped on every update
///   __temp/               user data backup, only alive during an update
///   <archive>.zip         downloaded release, removed after install
/// ```
#[derive(Debug, Clone)]
pub struct ServerPaths {
    server_dir: PathBuf,
    install_root: PathBuf,
}

impl ServerPaths {
    pub fn new(servers_root: &Path, server_id: &str) -> Self {
        let server_dir = servers_root.join(server_id);
        let install_root = server_dir.join(SERVER_FILES_DIR);
        Self {
            server_dir,
            install_root,
        }
    }

    pub fn server_dir(&self) -> &Path {
        &self.server_dir
    }

    pub fn install_root(&self) -> &Path {
        &self.install_root
    }

    /// Sibling of the installation root, so wiping the root never touches it.
    pub fn temp_backup_dir(&self) -> PathBuf {
        self.server_dir.join(TEMP_BACKUP_DIR)
    }

    pub fn executable(&self, game: &GameDefinition) -> PathBuf {
        join_relative(&self.install_root, &game.start_path)
    }

    pub fn data_dir(&self, game: &GameDefinition) -> PathBuf {
        join_relative(&self.install_root, &game.data_dir)
    }

    pub fn version_marker(&self, game: &GameDefinition) -> PathBuf {
        join_relative(&self.install_root, &game.version_file)
    }

    pub fn archive_path(&self, game: &GameDefinition, version: &str) -> PathBuf {
        self.server_dir.join(game.archive_name(version))
    }
}

/// Join a `/`-separated relative path onto `base` using native separators.
pub fn join_relative(base: &Path, relative: &str) -> PathBuf {
    relative
        .split(['/', '\\'])
        .filter(|part| !part.is_empty())
        .fold(base.to_path_buf(), |acc, part| acc.join(part))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_keeps_backup_outside_install_root() {
        let paths = ServerPaths::new(Path::new("/srv/servers"), "3");
        assert_eq!(paths.install_root(), Path::new("/srv/servers/3/serverfiles"));
        assert_eq!(paths.temp_backup_dir(), PathBuf::from("/srv/servers/3/__temp"));
        assert!(!paths.temp_backup_dir().starts_with(paths.install_root()));
    }

    #[test]
    fn game_relative_paths_land_under_install_root() {
        let game = GameDefinition::xonotic();
        let paths = ServerPaths::new(Path::new("/srv/servers"), "3");
        assert_eq!(
            paths.data_dir(&game),
            PathBuf::from("/srv/servers/3/serverfiles/Xonotic/data")
        );
        assert_eq!(
            paths.version_marker(&game),
            PathBuf::from("/srv/servers/3/serverfiles/Xonotic/version.txt")
        );
        assert_eq!(
            paths.archive_path(&game, "0.8.6"),
            PathBuf::from("/srv/servers/3/xonotic-0.8.6.zip")
        );
    }

    #[test]
    fn join_relative_accepts_backslashes() {
        assert_eq!(
            join_relative(Path::new("/a"), "Xonotic\\data"),
            PathBuf::from("/a/Xonotic/data")
        );
    }
}
