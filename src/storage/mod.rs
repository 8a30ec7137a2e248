//! Local filesystem storage for uploaded file blobs.

use std::path::{Path, PathBuf};

use crate::errors::AppError;

/// Outcome of removing a blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobRemoval {
    Removed,
    AlreadyAbsent,
}

/// Stores uploaded files under a single directory, one blob per record.
#[derive(Debug, Clone)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub async fn ensure_dir(&self) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Directory name recorded in a file's relative `path`.
    pub fn prefix(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "uploads".to_string())
    }

    /// Build a unique stored name for an upload, keeping a readable suffix.
    pub fn stored_name(original: &str) -> String {
        let sanitized: String = original
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        let sanitized = sanitized.trim_start_matches('.');
        let sanitized = if sanitized.is_empty() {
            "upload.bin"
        } else {
            sanitized
        };
        format!("{}-{}", uuid::Uuid::new_v4().simple(), sanitized)
    }

    /// Write a blob and return its size in bytes.
    pub async fn save(&self, name: &str, data: &[u8]) -> Result<u64, AppError> {
        let target = self.resolve(name)?;
        self.ensure_dir().await?;
        tokio::fs::write(&target, data).await.map_err(|e| {
            tracing::error!("Failed to store blob {}: {}", target.display(), e);
            AppError::Persistence(format!("Failed to store upload: {}", e))
        })?;
        Ok(data.len() as u64)
    }

    /// Read a blob, or `None` if it is gone.
    pub async fn read(&self, name: &str) -> Result<Option<Vec<u8>>, AppError> {
        let target = self.resolve(name)?;
        match tokio::fs::read(&target).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a blob. A blob that is already gone is not an error.
    pub async fn remove(&self, name: &str) -> Result<BlobRemoval, AppError> {
        let target = self.resolve(name)?;
        match tokio::fs::remove_file(&target).await {
            Ok(()) => Ok(BlobRemoval::Removed),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("Blob {} was already absent", target.display());
                Ok(BlobRemoval::AlreadyAbsent)
            }
            Err(e) => {
                tracing::error!("Failed to delete blob {}: {}", target.display(), e);
                Err(AppError::Persistence(format!(
                    "Failed to delete stored file: {}",
                    e
                )))
            }
        }
    }

    /// Map a stored name to a path inside the root, rejecting anything that could escape it.
    fn resolve(&self, name: &str) -> Result<PathBuf, AppError> {
        let candidate = Path::new(name);
        let mut components = candidate.components();
        match (components.next(), components.next()) {
            (Some(std::path::Component::Normal(_)), None) => Ok(self.root.join(candidate)),
            _ => Err(AppError::Internal(format!("Invalid stored file name {:?}", name))),
        }
    }
}
