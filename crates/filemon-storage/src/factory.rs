use crate::{LocalStorage, MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
use filemon_core::Config;
use std::sync::Arc;

/// Create a backup storage backend based on configuration
pub async fn create_storage(config: &Config) -> StorageResult<Arc<dyn Storage>> {
    match config.storage_backend {
        StorageBackend::Local => {
            if config.backup_path.trim().is_empty() {
                return Err(StorageError::ConfigError(
                    "BACKUP_PATH not configured".to_string(),
                ));
            }
            let storage = LocalStorage::new(&config.backup_path).await?;
            tracing::info!(path = %config.backup_path, "Using local backup storage");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory backup storage; backups will not survive a restart");
            Ok(Arc::new(MemoryStorage::new()))
        }
    }
}
