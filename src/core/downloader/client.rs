use std::path::Path;
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use crate::core::error::{ServerError, ServerResult};

/// Transfer progress of a single download.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DownloadProgress {
    pub url: String,
    pub bytes_received: u64,
    /// `None` when the server sent no `Content-Length`.
    pub total_bytes: Option<u64>,
    pub percent: Option<u8>,
}

/// Observer for download progress. Purely informational.
pub trait ProgressReporter: Send + Sync {
    fn report(&self, progress: &DownloadProgress);
}

impl<F> ProgressReporter for F
where
    F: Fn(&DownloadProgress) + Send + Sync,
{
    fn report(&self, progress: &DownloadProgress) {
        self(progress)
    }
}

/// Streams a remote file to disk.
#[derive(Clone)]
pub struct Downloader {
    client: Client,
    /// Falls back to debug logging every 10% when unset.
    reporter: Option<Arc<dyn ProgressReporter>>,
}

impl Downloader {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Download `url` into `dest`, creating parent directories as needed.
    ///
    /// A failed transfer removes the partial file. Returns the byte count.
    pub async fn download_file(&self, url: &str, dest: &Path) -> ServerResult<u64> {
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| ServerError::io(parent, e))?;
        }

        let result = self.stream_to_file(url, dest).await;
        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(dest).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!("Cannot remove partial download {:?}: {}", dest, e);
                }
            }
        }
        result
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> ServerResult<u64> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServerError::HttpStatus {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length();
        info!("Downloading {} ({:?} bytes) -> {:?}", url, total_bytes, dest);

        // Scoped so the handle is closed before callers touch the file.
        let received = {
            let mut file = tokio::fs::File::create(dest)
                .await
                .map_err(|e| ServerError::io(dest, e))?;

            let mut stream = response.bytes_stream();
            let mut received = 0_u64;
            let mut last_logged = None;
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                file.write_all(&chunk)
                    .await
                    .map_err(|e| ServerError::io(dest, e))?;
                received = received.saturating_add(chunk.len() as u64);

                let progress = DownloadProgress {
                    url: url.to_string(),
                    bytes_received: received,
                    total_bytes,
                    percent: percent_of(received, total_bytes),
                };
                self.emit(&progress, &mut last_logged);
            }

            file.flush().await.map_err(|e| ServerError::io(dest, e))?;
            received
        };

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, received);
        Ok(received)
    }

    fn emit(&self, progress: &DownloadProgress, last_logged: &mut Option<u8>) {
        if let Some(reporter) = &self.reporter {
            reporter.report(progress);
            return;
        }

        let Some(percent) = progress.percent else {
            return;
        };
        let bucket = percent / 10;
        if *last_logged != Some(bucket) {
            *last_logged = Some(bucket);
            debug!(
                "Downloaded {} of {:?} bytes. {} % complete...",
                progress.bytes_received, progress.total_bytes, percent
            );
        }
    }
}

fn percent_of(received: u64, total: Option<u64>) -> Option<u8> {
    match total {
        Some(0) | None => None,
        Some(total) => Some(((received.min(total) * 100) / total) as u8),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::testing::{serve, Route};
    use std::sync::Mutex;

    #[test]
    fn percent_is_bounded() {
        assert_eq!(percent_of(50, Some(200)), Some(25));
        assert_eq!(percent_of(300, Some(200)), Some(100));
        assert_eq!(percent_of(10, None), None);
        assert_eq!(percent_of(10, Some(0)), None);
    }

    #[tokio::test]
    async fn downloads_file_and_reports_progress() {
        let payload: Vec<u8> = (0..64 * 1024).map(|i| (i % 251) as u8).collect();
        let server = serve(vec![Route::bytes("/file.zip", payload.clone())]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("nested").join("file.zip");

        let seen: Arc<Mutex<Vec<DownloadProgress>>> = Arc::default();
        let sink = seen.clone();
        let downloader = Downloader::new(Client::new()).with_reporter(Arc::new(
            move |p: &DownloadProgress| sink.lock().unwrap().push(p.clone()),
        ));

        let bytes = downloader
            .download_file(&server.url("/file.zip"), &dest)
            .await
            .unwrap();

        assert_eq!(bytes, payload.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), payload);
        let seen = seen.lock().unwrap();
        let last = seen.last().unwrap();
        assert_eq!(last.bytes_received, payload.len() as u64);
        assert_eq!(last.percent, Some(100));
    }

    #[tokio::test]
    async fn http_error_leaves_no_file() {
        let server = serve(vec![]).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("missing.zip");

        let err = Downloader::new(Client::new())
            .download_file(&server.url("/missing.zip"), &dest)
            .await
            .unwrap_err();

        assert!(matches!(err, ServerError::HttpStatus { status: 404, .. }));
        assert!(!dest.exists());
    }
}
