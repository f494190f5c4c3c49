use filemon_core::models::{FileDetail, FileSummary};
use filemon_core::AppError;
use filemon_db::FileRecordRepository;
use filemon_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;

use crate::retention::delete_backup;
use crate::statistics::StatisticsCache;

/// Read and delete access to stored file records.
#[derive(Clone)]
pub struct CatalogService {
    repository: Arc<dyn FileRecordRepository>,
    storage: Arc<dyn Storage>,
    cache: Option<Arc<StatisticsCache>>,
}

impl CatalogService {
    pub fn new(repository: Arc<dyn FileRecordRepository>, storage: Arc<dyn Storage>) -> Self {
        Self {
            repository,
            storage,
            cache: None,
        }
    }

    pub fn with_statistics_cache(mut self, cache: Arc<StatisticsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// All files, most recently received first.
    pub async fn list_files(&self) -> Result<Vec<FileSummary>, AppError> {
        let records = self.repository.list_all_ordered_by_received_desc().await?;
        Ok(records.iter().map(|r| r.to_summary()).collect())
    }

    pub async fn get_file(&self, id: Uuid) -> Result<Option<FileDetail>, AppError> {
        let record = self.repository.get_by_id_with_transactions(id).await?;
        Ok(record.map(|r| r.into_detail()))
    }

    /// Delete a file's backup, then its record.
    #[tracing::instrument(skip(self), fields(file_id = %id))]
    pub async fn delete_by_id(&self, id: Uuid) -> Result<(), AppError> {
        let record = self
            .repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;

        delete_backup(self.storage.as_ref(), &record).await?;
        self.repository.delete(&record).await?;
        self.repository.commit().await?;

        if let Some(cache) = &self.cache {
            cache.invalidate();
        }

        tracing::info!(backup_path = %record.backup_path, "File deleted");
        Ok(())
    }
}
