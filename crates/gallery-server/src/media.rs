use std::path::{Path, PathBuf};

use anyhow::Context;
use axum::body::Bytes;
use uuid::Uuid;

/// A file received in a multipart form.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Uploaded files on local disk. Records store paths relative to the root.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Writes `bytes` under `dir` with a fresh name and returns the path
    /// relative to the media root.
    pub async fn save(&self, dir: &str, extension: &str, bytes: &[u8]) -> anyhow::Result<String> {
        let target_dir = self.root.join(dir);
        tokio::fs::create_dir_all(&target_dir)
            .await
            .with_context(|| format!("Failed to create {}", target_dir.display()))?;

        let relative = format!("{}/{}.{}", dir, Uuid::new_v4(), extension);
        let path = self.root.join(&relative);
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;

        Ok(relative)
    }

    /// Best-effort removal; a file that is already gone is not an error.
    pub async fn remove(&self, relative: &str) {
        let path = self.root.join(relative);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %path.display(), "Failed to remove media file: {}", e),
        }
    }
}
