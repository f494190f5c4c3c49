//! Storage abstraction trait
//!
//! This module defines the Storage trait that all backup backends must implement.

use crate::StorageBackend;
use async_trait::async_trait;
use bytes::Bytes;
use filemon_core::AppError;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Upload failed: {0}")]
    UploadFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(format!("Backup {}", key)),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Backup storage abstraction
///
/// The ingestion pipeline writes every attempt's raw bytes through this trait
/// and keeps only the returned key. The retention sweep deletes by that key.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Write a backup copy of `data` and return its storage key.
    ///
    /// Each call produces a fresh key, even for a file name seen before.
    async fn save(&self, file_name: &str, data: Bytes) -> StorageResult<String>;

    /// Read a backup by its storage key
    async fn read(&self, storage_key: &str) -> StorageResult<Bytes>;

    /// Delete a backup by its storage key. Deleting a missing backup succeeds.
    async fn delete(&self, storage_key: &str) -> StorageResult<()>;

    /// Check if a backup exists
    async fn exists(&self, storage_key: &str) -> StorageResult<bool>;

    /// Get the storage backend type
    fn backend_type(&self) -> StorageBackend;
}
