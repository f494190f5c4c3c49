use chrono::{DateTime, Utc};
use filemon_core::models::FileRecord;
use filemon_core::AppError;
use filemon_db::FileRecordRepository;
use filemon_storage::Storage;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

use crate::statistics::StatisticsCache;

/// Delete a record's backup. Records stored without a backup have nothing to delete.
pub(crate) async fn delete_backup(storage: &dyn Storage, record: &FileRecord) -> Result<(), AppError> {
    if record.backup_path.is_empty() {
        return Ok(());
    }
    storage.delete(&record.backup_path).await?;
    Ok(())
}

/// Removes expired file records together with their backups.
#[derive(Clone)]
pub struct RetentionService {
    repository: Arc<dyn FileRecordRepository>,
    storage: Arc<dyn Storage>,
    cache: Option<Arc<StatisticsCache>>,
}

impl RetentionService {
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

    /// Start the background sweep, purging every `period`.
    /// Returns a JoinHandle for graceful shutdown
    pub fn start(self: Arc<Self>, period: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut sweep_interval = interval(period);

            loop {
                sweep_interval.tick().await;

                tracing::info!("Starting scheduled purge of expired files");

                match self.purge_expired(Utc::now()).await {
                    Ok(purged) => tracing::info!(purged, "Scheduled purge completed"),
                    Err(e) => tracing::error!(error = %e, "Scheduled purge failed"),
                }
            }
        })
    }

    pub async fn list_expired(&self, as_of: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError> {
        self.repository.list_expired(as_of).await
    }

    /// Delete each record's backup, then the record. Returns the number purged.
    ///
    /// The first failure aborts the batch; records before it stay purged.
    #[tracing::instrument(skip(self, records), fields(retention.batch = records.len()))]
    pub async fn purge(&self, records: &[FileRecord]) -> Result<usize, AppError> {
        let mut purged = 0;

        for record in records {
            tracing::info!(
                file_id = %record.id,
                backup_path = %record.backup_path,
                expires_at = ?record.expires_at,
                "Purging expired file"
            );

            delete_backup(self.storage.as_ref(), record).await?;
            self.repository.delete(record).await?;
            purged += 1;
        }

        if purged > 0 {
            self.repository.commit().await?;
            if let Some(cache) = &self.cache {
                cache.invalidate();
            }
        }

        Ok(purged)
    }

    /// Purge every record expired as of `now`.
    #[tracing::instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize, AppError> {
        let expired = self.list_expired(now).await?;
        self.purge(&expired).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{received_record, rejected_record, FailingStorage, MockFileRepository};
    use bytes::Bytes;

    struct Fixture {
        repository: MockFileRepository,
        storage: FailingStorage,
        service: RetentionService,
    }

    fn fixture() -> Fixture {
        let repository = MockFileRepository::new();
        let storage = FailingStorage::new();
        let service = RetentionService::new(
            Arc::new(repository.clone()),
            Arc::new(storage.clone()),
        );
        Fixture {
            repository,
            storage,
            service,
        }
    }

    async fn stored_with_expiry(
        fixture: &Fixture,
        name: &str,
        expires_at: Option<DateTime<Utc>>,
    ) -> FileRecord {
        let key = fixture
            .storage
            .save(name, Bytes::from_static(b"payload"))
            .await
            .unwrap();
        let record = FileRecord {
            expires_at,
            backup_path: key,
            ..received_record(name)
        };
        fixture.repository.insert(record.clone());
        record
    }

    #[tokio::test]
    async fn purges_only_records_expired_as_of_now() {
        let fixture = fixture();
        let now = Utc::now();
        let past = stored_with_expiry(&fixture, "past", Some(now - chrono::Duration::days(1))).await;
        let exact = stored_with_expiry(&fixture, "exact", Some(now)).await;
        let future = stored_with_expiry(&fixture, "future", Some(now + chrono::Duration::seconds(1))).await;
        let never = stored_with_expiry(&fixture, "never", None).await;

        let purged = fixture.service.purge_expired(now).await.unwrap();
        assert_eq!(purged, 2);

        let remaining: Vec<_> = fixture.repository.records().into_iter().map(|r| r.id).collect();
        assert!(!remaining.contains(&past.id));
        assert!(!remaining.contains(&exact.id));
        assert!(remaining.contains(&future.id));
        assert!(remaining.contains(&never.id));

        assert!(!fixture.storage.exists(&past.backup_path).await.unwrap());
        assert!(fixture.storage.exists(&future.backup_path).await.unwrap());
        assert_eq!(fixture.repository.commit_calls(), 1);
    }

    #[tokio::test]
    async fn missing_backup_is_not_an_error() {
        let fixture = fixture();
        let record = FileRecord {
            expires_at: Some(Utc::now() - chrono::Duration::days(1)),
            ..rejected_record("vanished")
        };
        fixture.repository.insert(record);

        assert_eq!(fixture.service.purge_expired(Utc::now()).await.unwrap(), 1);
        assert!(fixture.repository.is_empty());
    }

    #[tokio::test]
    async fn record_without_backup_skips_storage() {
        let fixture = fixture();
        let record = FileRecord {
            expires_at: Some(Utc::now() - chrono::Duration::days(1)),
            backup_path: String::new(),
            ..rejected_record("nobackup")
        };
        fixture.repository.insert(record);

        assert_eq!(fixture.service.purge_expired(Utc::now()).await.unwrap(), 1);
        assert_eq!(fixture.storage.delete_calls(), 0);
    }

    #[tokio::test]
    async fn storage_failure_fails_the_batch() {
        let fixture = fixture();
        let now = Utc::now();
        stored_with_expiry(&fixture, "a", Some(now - chrono::Duration::days(1))).await;
        stored_with_expiry(&fixture, "b", Some(now - chrono::Duration::days(2))).await;
        fixture.storage.fail_deletes();

        let err = fixture.service.purge_expired(now).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert_eq!(fixture.repository.len(), 2);
        assert_eq!(fixture.repository.delete_calls(), 0);
    }

    #[tokio::test]
    async fn failure_mid_batch_keeps_earlier_purges() {
        let fixture = fixture();
        let now = Utc::now();
        let first = stored_with_expiry(&fixture, "first", Some(now - chrono::Duration::days(2))).await;
        let second = stored_with_expiry(&fixture, "second", Some(now - chrono::Duration::days(1))).await;
        fixture.repository.fail_deletes_after(1);

        let err = fixture.service.purge_expired(now).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));

        let remaining: Vec<_> = fixture.repository.records().into_iter().map(|r| r.id).collect();
        assert_eq!(remaining, vec![second.id]);
        assert!(!fixture.storage.exists(&first.backup_path).await.unwrap());
        assert_eq!(fixture.repository.delete_calls(), 2);
        assert_eq!(fixture.repository.commit_calls(), 0);
    }

    #[tokio::test]
    async fn empty_batch_purges_nothing() {
        let fixture = fixture();
        assert_eq!(fixture.service.purge(&[]).await.unwrap(), 0);
        assert_eq!(fixture.repository.commit_calls(), 0);
    }

    #[tokio::test]
    async fn background_sweep_purges_on_first_tick() {
        let fixture = fixture();
        stored_with_expiry(&fixture, "old", Some(Utc::now() - chrono::Duration::days(1))).await;

        let handle = Arc::new(fixture.service.clone()).start(Duration::from_secs(3600));
        for _ in 0..50 {
            if fixture.repository.is_empty() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        assert!(fixture.repository.is_empty());
    }
}
