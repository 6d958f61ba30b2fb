//! Copies of source images taken before in-place rewrites.

use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Copies `source` into `<backup_root>/<year>/<month>/`.
///
/// An existing copy is never overwritten: the name gains `-1`, `-2`, and so
/// on until it is free. Returns the path of the copy.
pub async fn create_backup(source: &Path, backup_root: &Path) -> io::Result<PathBuf> {
    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        )
    })?;
    let dir = backup_root.join(Utc::now().format("%Y/%m").to_string());
    tokio::fs::create_dir_all(&dir).await?;

    let target = unique_path(&dir, Path::new(file_name)).await;
    tokio::fs::copy(source, &target).await?;
    debug!(source = %source.display(), backup = %target.display(), "Backed up original");
    Ok(target)
}

async fn unique_path(dir: &Path, file_name: &Path) -> PathBuf {
    let candidate = dir.join(file_name);
    if !exists(&candidate).await {
        return candidate;
    }

    let stem = file_name
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let extension = file_name
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    let mut counter = 1u32;
    loop {
        let candidate = dir.join(format!("{}-{}{}", stem, counter, extension));
        if !exists(&candidate).await {
            return candidate;
        }
        counter += 1;
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(true)
}
