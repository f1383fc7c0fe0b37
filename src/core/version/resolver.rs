// ─── Version Resolver ───
// Latest release from the remote tag feed, installed release from the marker file.

use std::path::PathBuf;
use std::sync::OnceLock;

use regex::Regex;
use reqwest::Client;
use tracing::{debug, info, instrument};

use super::Version;
use crate::core::error::{ServerError, ServerResult};
use crate::core::paths::ServerPaths;
use crate::core::plugin::GameDefinition;

fn release_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\d+\.\d+\.\d+").expect("release pattern is valid"))
}

/// First dotted numeric triplet in `text`, e.g. `0.8.6` out of
/// `.../xonotic-0.8.6.zip...`.
pub fn extract_version(text: &str) -> Option<Version> {
    release_pattern()
        .find(text)
        .and_then(|m| Version::parse(m.as_str()))
}

pub struct VersionResolver {
    client: Client,
    feed_url: String,
    start_path: String,
    executable: PathBuf,
    marker: PathBuf,
}

impl VersionResolver {
    pub fn new(client: Client, game: &GameDefinition, paths: &ServerPaths) -> Self {
        Self {
            client,
            feed_url: game.release_feed_url.clone(),
            start_path: game.start_path.clone(),
            executable: paths.executable(game),
            marker: paths.version_marker(game),
        }
    }

    /// Fetch the release feed and pick the first `x.y.z` in it.
    #[instrument(skip(self), fields(feed = %self.feed_url))]
    pub async fn resolve_remote_version(&self) -> ServerResult<Version> {
        let response = self.client.get(&self.feed_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::HttpStatus {
                url: self.feed_url.clone(),
                status: status.as_u16(),
            });
        }

        let feed = response.text().await?;
        let version = extract_version(&feed).ok_or_else(|| ServerError::VersionParse {
            source_name: self.feed_url.clone(),
        })?;

        info!("Latest remote release: {}", version);
        Ok(version)
    }

    /// Installed release. `NotInstalled` when the executable is gone, whatever
    /// the marker says.
    pub async fn read_local_version(&self) -> ServerResult<Version> {
        let installed = tokio::fs::try_exists(&self.executable)
            .await
            .map_err(|e| ServerError::io(&self.executable, e))?;
        if !installed {
            return Err(ServerError::NotInstalled {
                start_path: self.start_path.clone(),
                executable: self.executable.clone(),
            });
        }

        let raw = tokio::fs::read_to_string(&self.marker)
            .await
            .map_err(|e| ServerError::io(&self.marker, e))?;

        Version::parse(&raw).ok_or_else(|| ServerError::VersionParse {
            source_name: self.marker.display().to_string(),
        })
    }

    pub async fn write_local_version(&self, version: &Version) -> ServerResult<()> {
        if let Some(parent) = self.marker.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServerError::io(parent, e))?;
        }

        tokio::fs::write(&self.marker, version.as_str())
            .await
            .map_err(|e| ServerError::io(&self.marker, e))?;

        debug!("Recorded installed version {} at {:?}", version, self.marker);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{serve, Route};
    use std::path::Path;

    fn resolver_for(
        root: &Path,
        feed_url: String,
    ) -> (VersionResolver, ServerPaths, GameDefinition) {
        let mut game = GameDefinition::xonotic();
        game.release_feed_url = feed_url;
        let paths = ServerPaths::new(root, "1");
        let resolver = VersionResolver::new(Client::new(), &game, &paths);
        (resolver, paths, game)
    }

    #[test]
    fn extracts_version_from_archive_name() {
        let text = r#"<link href="https://dl.xonotic.org/xonotic-0.8.6.zip"/>"#;
        assert_eq!(extract_version(text).unwrap().as_str(), "0.8.6");
    }

    #[test]
    fn first_match_wins() {
        let text = "<title>xonotic-v0.8.6</title><title>xonotic-v0.8.5</title>";
        assert_eq!(extract_version(text).unwrap().as_str(), "0.8.6");
    }

    #[test]
    fn no_triplet_means_no_version() {
        assert!(extract_version("release 0.8 published 2023-06-12").is_none());
    }

    #[tokio::test]
    async fn resolves_remote_version_from_feed() {
        let server = serve(vec![Route::text(
            "/tags",
            "<entry>xonotic-0.8.6.zip</entry>",
        )])
        .await;
        let dir = tempfile::tempdir().unwrap();
        let (resolver, _, _) = resolver_for(dir.path(), server.url("/tags"));

        let version = resolver.resolve_remote_version().await.unwrap();
        assert_eq!(version.as_str(), "0.8.6");
    }

    #[tokio::test]
    async fn feed_without_version_is_a_parse_error() {
        let server = serve(vec![Route::text("/tags", "<feed>nothing here</feed>")]).await;
        let dir = tempfile::tempdir().unwrap();
        let (resolver, _, _) = resolver_for(dir.path(), server.url("/tags"));

        let err = resolver.resolve_remote_version().await.unwrap_err();
        assert!(matches!(err, ServerError::VersionParse { .. }));
    }

    #[tokio::test]
    async fn missing_feed_is_a_network_error() {
        let server = serve(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let (resolver, _, _) = resolver_for(dir.path(), server.url("/tags"));

        let err = resolver.resolve_remote_version().await.unwrap_err();
        assert!(matches!(err, ServerError::HttpStatus { status: 404, .. }));
    }

    #[tokio::test]
    async fn local_version_requires_executable() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, paths, game) = resolver_for(dir.path(), String::new());
        let marker = paths.version_marker(&game);
        std::fs::create_dir_all(marker.parent().unwrap()).unwrap();
        std::fs::write(&marker, "0.8.6").unwrap();

        let err = resolver.read_local_version().await.unwrap_err();
        assert!(matches!(err, ServerError::NotInstalled { .. }));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn unreadable_executable_path_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, paths, game) = resolver_for(dir.path(), String::new());
        // A regular file where the executable's directory should be.
        let exe = paths.executable(&game);
        let blocker = exe.parent().unwrap();
        std::fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        std::fs::write(blocker, b"not a directory").unwrap();

        let err = resolver.read_local_version().await.unwrap_err();
        assert!(matches!(err, ServerError::Io { ref path, .. } if *path == exe));
    }

    #[tokio::test]
    async fn missing_marker_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, paths, game) = resolver_for(dir.path(), String::new());
        let exe = paths.executable(&game);
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, b"bin").unwrap();

        let err = resolver.read_local_version().await.unwrap_err();
        assert!(matches!(err, ServerError::Io { .. }));
    }

    #[tokio::test]
    async fn written_version_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, paths, game) = resolver_for(dir.path(), String::new());
        let exe = paths.executable(&game);
        std::fs::create_dir_all(exe.parent().unwrap()).unwrap();
        std::fs::write(&exe, b"bin").unwrap();

        resolver
            .write_local_version(&Version::parse("0.8.5").unwrap())
            .await
            .unwrap();
        resolver
            .write_local_version(&Version::parse("0.8.6").unwrap())
            .await
            .unwrap();

        assert_eq!(resolver.read_local_version().await.unwrap().as_str(), "0.8.6");
    }
}
