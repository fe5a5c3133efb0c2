//! Byte storage for uploaded and generated files.
//!
//! The database keeps metadata only; bytes live behind [`FileStorage`] and
//! are addressed by an opaque handle stored in `files.path`.

use std::path::PathBuf;
use std::pin::Pin;

use async_trait::async_trait;
use tokio::io::AsyncRead;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// Readable byte stream returned by downloads
pub type ByteStream = Pin<Box<dyn AsyncRead + Send>>;

/// Result of storing bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub handle: String,
    pub size_bytes: i64,
}

/// Storage backend for file contents
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist bytes under a fresh handle derived from `original_name`.
    async fn store(&self, bytes: Vec<u8>, original_name: &str) -> AppResult<StoredObject>;

    /// Open stored bytes for reading. Unknown handles are `NotFound`.
    async fn retrieve(&self, handle: &str) -> AppResult<ByteStream>;

    /// Delete stored bytes. Removing a missing handle succeeds.
    async fn remove(&self, handle: &str) -> AppResult<()>;
}

/// Stores files as plain files under one root directory
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
}

const MAX_STORED_NAME_LENGTH: usize = 100;

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, handle: &str) -> AppResult<PathBuf> {
        if handle.is_empty()
            || handle.contains(|c: char| c == '/' || c == '\\')
            || handle == "."
            || handle == ".."
        {
            return Err(AppError::storage(format!("Invalid storage handle: {}", handle)));
        }
        Ok(self.root.join(handle))
    }
}

/// Keep a recognisable, filesystem-safe tail of the client's file name.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    let tail_start = cleaned.len().saturating_sub(MAX_STORED_NAME_LENGTH);
    match &cleaned[tail_start..] {
        "" => "file".to_string(),
        tail => tail.to_string(),
    }
}

#[async_trait]
impl FileStorage for LocalDiskStorage {
    async fn store(&self, bytes: Vec<u8>, original_name: &str) -> AppResult<StoredObject> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?;

        let handle = format!(
            "{}_{}",
            Uuid::new_v4().simple(),
            sanitize_file_name(original_name)
        );
        let path = self.resolve(&handle)?;
        let size_bytes = bytes.len() as i64;

        tokio::fs::write(&path, &bytes)
            .await
            .map_err(|e| AppError::storage(e.to_string()))?;

        tracing::debug!(handle = %handle, size_bytes, "Stored file");
        Ok(StoredObject { handle, size_bytes })
    }

    async fn retrieve(&self, handle: &str) -> AppResult<ByteStream> {
        let path = self.resolve(handle)?;
        match tokio::fs::File::open(&path).await {
            Ok(file) => Ok(Box::pin(file)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(handle = %handle, "Stored file is missing");
                Err(AppError::NotFound)
            }
            Err(e) => Err(AppError::storage(e.to_string())),
        }
    }

    async fn remove(&self, handle: &str) -> AppResult<()> {
        let path = self.resolve(handle)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::storage(e.to_string())),
        }
    }
}
