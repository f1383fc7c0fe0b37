use std::path::Path;

use crate::core::error::{ServerError, ServerResult};

/// Copy `source` into `destination` off the async runtime.
pub async fn copy_dir(source: &Path, destination: &Path, recursive: bool) -> ServerResult<()> {
    let source = source.to_path_buf();
    let destination = destination.to_path_buf();
    tokio::task::spawn_blocking(move || copy_dir_recursive(&source, &destination, recursive))
        .await
        .map_err(|e| ServerError::Other(format!("Task join error: {e}")))?
}

/// Plain tree copy: files are overwritten by name, nothing at the
/// destination is deleted. Symlinks and other special entries are skipped.
///
/// `source` must exist; `destination` is created when missing.
pub fn copy_dir_recursive(source: &Path, destination: &Path, recursive: bool) -> ServerResult<()> {
    let metadata = std::fs::metadata(source).map_err(|e| ServerError::io(source, e))?;
    if !metadata.is_dir() {
        return Err(ServerError::Other(format!(
            "Source directory not found: {}",
            source.display()
        )));
    }

    std::fs::create_dir_all(destination).map_err(|e| ServerError::io(destination, e))?;

    for entry in std::fs::read_dir(source).map_err(|e| ServerError::io(source, e))? {
        let entry = entry.map_err(|e| ServerError::io(source, e))?;
        let src_path = entry.path();
        let dst_path = destination.join(entry.file_name());
        let file_type = entry
            .file_type()
            .map_err(|e| ServerError::io(&src_path, e))?;

        if file_type.is_dir() {
            if recursive {
                copy_dir_recursive(&src_path, &dst_path, true)?;
            }
        } else if file_type.is_file() {
            std::fs::copy(&src_path, &dst_path).map_err(|e| ServerError::io(dst_path, e))?;
        }
    }

    Ok(())
}
