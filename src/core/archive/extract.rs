use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{ServerError, ServerResult};

/// Unpack `zip_path` into `destination` off the async runtime.
pub async fn extract_zip(zip_path: &Path, destination: &Path) -> ServerResult<usize> {
    let zip_path = zip_path.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || extract_zip_file(&zip_path, &destination))
        .await
        .map_err(|e| ServerError::Other(format!("Task join error: {e}")))?
}

/// Unpack every entry of `zip_path` under `destination`, keeping the
/// archive's own directory structure. Existing files are overwritten.
///
/// Returns the number of files written.
pub fn extract_zip_file(zip_path: &Path, destination: &Path) -> ServerResult<usize> {
    let zip_file = std::fs::File::open(zip_path).map_err(|e| ServerError::io(zip_path, e))?;
    let mut archive = zip::ZipArchive::new(zip_file)?;

    std::fs::create_dir_all(destination).map_err(|e| ServerError::io(destination, e))?;

    let mut written = 0;
    for index in 0..archive.len() {
        let mut zipped = archive.by_index(index)?;

        // Rejects absolute paths and `..` escapes.
        let rel_path: PathBuf = zipped
            .enclosed_name()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| {
                ServerError::Other(format!("Invalid zip entry path: {}", zipped.name()))
            })?;
        if rel_path.as_os_str().is_empty() {
            continue;
        }

        let out_path = destination.join(rel_path);
        if zipped.is_dir() {
            std::fs::create_dir_all(&out_path).map_err(|e| ServerError::io(out_path, e))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ServerError::io(parent, e))?;
        }

        let mut out =
            std::fs::File::create(&out_path).map_err(|e| ServerError::io(&out_path, e))?;
        std::io::copy(&mut zipped, &mut out).map_err(|e| ServerError::io(&out_path, e))?;
        written += 1;
    }

    debug!("Extracted {} files from {:?} into {:?}", written, zip_path, destination);
    Ok(written)
}
