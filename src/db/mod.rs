//! Persistence module for the JSON document.
//!
//! The document file is the source of truth: every operation re-reads it, and every
//! mutation rewrites it in full. Nothing is cached between requests.

mod repository;

pub use repository::*;

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;

use crate::errors::AppError;
use crate::models::Document;

/// Loads and saves the whole document, serialising load-modify-save cycles.
pub struct DocumentStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DocumentStore {
    /// Open the store, creating the parent directory and an empty document if needed.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let store = Self {
            path: path.to_path_buf(),
            lock: Mutex::new(()),
        };
        store.load().await?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the document from disk.
    ///
    /// A missing file is replaced by a persisted empty document. A file that is not JSON
    /// is moved aside and an empty document is returned in its place. JSON that does not
    /// fit the document layout is an error and the file is not touched.
    pub async fn load(&self) -> Result<Document, AppError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!("{} not found, creating a new one", self.path.display());
                let document = Document::default();
                self.save(&document).await?;
                return Ok(document);
            }
            Err(e) => {
                tracing::error!("Failed to read {}: {}", self.path.display(), e);
                return Err(AppError::Persistence(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )));
            }
        };

        let value: serde_json::Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                tracing::error!(
                    "{} is not valid JSON ({}), starting from an empty document",
                    self.path.display(),
                    e
                );
                self.quarantine().await;
                return Ok(Document::default());
            }
        };

        // Valid JSON that does not fit the model is left in place for an operator.
        serde_json::from_value(value).map_err(|e| {
            tracing::error!(
                "{} does not match the document layout: {}",
                self.path.display(),
                e
            );
            AppError::Persistence(format!(
                "{} does not match the document layout: {}",
                self.path.display(),
                e
            ))
        })
    }

    /// Serialize and overwrite the document on disk.
    ///
    /// Writes go to a sibling temp file which is then renamed over the target, so a
    /// failed write never leaves a truncated document behind.
    pub async fn save(&self, document: &Document) -> Result<(), AppError> {
        let json = serde_json::to_string_pretty(document).map_err(|e| {
            tracing::error!("Failed to serialize document: {}", e);
            AppError::Persistence(format!("Failed to serialize document: {}", e))
        })?;

        let tmp_path = self.tmp_path();
        let written = match tokio::fs::write(&tmp_path, json.as_bytes()).await {
            Ok(()) => tokio::fs::rename(&tmp_path, &self.path).await,
            Err(e) => Err(e),
        };

        if let Err(e) = written {
            tracing::error!("Error writing to {}: {}", self.path.display(), e);
            tokio::fs::remove_file(&tmp_path).await.ok();
            return Err(AppError::Persistence(format!(
                "Failed to write {}: {}",
                self.path.display(),
                e
            )));
        }

        Ok(())
    }

    /// Run a read-only closure against a freshly loaded document.
    pub async fn read<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&Document) -> Result<T, AppError>,
    {
        let _guard = self.lock.lock().await;
        let document = self.load().await?;
        f(&document)
    }

    /// Load, apply `f`, and save, all under the store lock.
    ///
    /// Nothing is written when `f` returns an error.
    pub async fn mutate<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut Document) -> Result<T, AppError>,
    {
        let _guard = self.lock.lock().await;
        let mut document = self.load().await?;
        let value = f(&mut document)?;
        self.save(&document).await?;
        Ok(value)
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    async fn quarantine(&self) {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "data.json".into());
        name.push(format!(".corrupt-{}", Utc::now().timestamp_millis()));
        let target = self.path.with_file_name(name);

        match tokio::fs::rename(&self.path, &target).await {
            Ok(()) => tracing::warn!("Moved unreadable document to {}", target.display()),
            Err(e) => tracing::warn!("Could not move unreadable document aside: {}", e),
        }
    }
}
