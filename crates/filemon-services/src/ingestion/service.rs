use bytes::Bytes;
use chrono::{Duration, Utc};
use filemon_core::models::{AcquirerType, IngestOutcome, NewFileRecord, UploadedFile};
use filemon_core::{AppError, Config, ErrorMetadata, IngestRequest, LogLevel};
use filemon_db::FileRecordRepository;
use filemon_processing::{content_hash, parse_file};
use filemon_storage::Storage;
use std::sync::Arc;

use crate::statistics::StatisticsCache;

/// Acquirer recorded for failures that happen before the company field is known.
const UNPARSED_ACQUIRER: AcquirerType = AcquirerType::UfCard;

/// Runs one ingestion attempt per call: deduplicate, parse, back up, persist.
///
/// Failures never escape `ingest`. They become a NotReceived record (best
/// effort) and a rejected outcome carrying the original failure's message.
#[derive(Clone)]
pub struct IngestionService {
    repository: Arc<dyn FileRecordRepository>,
    storage: Arc<dyn Storage>,
    received_retention: Duration,
    failed_retention: Duration,
    max_file_size_bytes: usize,
    cache: Option<Arc<StatisticsCache>>,
}

impl IngestionService {
    pub fn new(
        repository: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn Storage>,
        config: &Config,
    ) -> Self {
        Self {
            repository,
            storage,
            received_retention: config.received_retention(),
            failed_retention: config.failed_retention(),
            max_file_size_bytes: config.max_file_size_bytes,
            cache: None,
        }
    }

    pub fn with_statistics_cache(mut self, cache: Arc<StatisticsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Check an upload request, then ingest it.
    ///
    /// A request that fails the check is refused with no side effect.
    pub async fn ingest_request(&self, request: IngestRequest) -> Result<IngestOutcome, AppError> {
        request.check(self.max_file_size_bytes)?;
        Ok(self.ingest(&request.file_name, Bytes::from(request.content)).await)
    }

    #[tracing::instrument(skip(self, content), fields(size_bytes = content.len(), content_hash = tracing::field::Empty))]
    pub async fn ingest(&self, file_name: &str, content: Bytes) -> IngestOutcome {
        let start = std::time::Instant::now();
        let file = UploadedFile {
            file_name: file_name.to_string(),
            content_hash: content_hash(&content),
            size_bytes: content.len() as i64,
        };
        tracing::Span::current().record("content_hash", file.content_hash.as_str());

        let mut acquirer = None;
        let result = self.process(&file, content.clone(), &mut acquirer).await;
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                log_failure(&err);
                self.record_failure(&file, content, acquirer.unwrap_or(UNPARSED_ACQUIRER), &err)
                    .await;
                IngestOutcome::rejected(&err.to_string())
            }
        };

        if let Some(cache) = &self.cache {
            cache.invalidate();
        }

        tracing::info!(
            kind = ?outcome.kind,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Ingestion finished"
        );
        outcome
    }

    async fn process(
        &self,
        file: &UploadedFile,
        content: Bytes,
        acquirer: &mut Option<AcquirerType>,
    ) -> Result<IngestOutcome, AppError> {
        if self.repository.exists_by_hash(&file.content_hash).await? {
            tracing::debug!("Content already ingested, skipping");
            return Ok(IngestOutcome::duplicate());
        }

        let transactions = parse_file(&content)?;
        let detected = transactions
            .first()
            .map(|t| AcquirerType::from_company(&t.company))
            .unwrap_or(AcquirerType::FagammonCard);
        *acquirer = Some(detected);

        let backup_path = self.storage.save(&file.file_name, content).await?;
        let record = NewFileRecord::received(
            file,
            backup_path.clone(),
            detected,
            transactions,
            Utc::now(),
            self.received_retention,
        );

        let stored = match self.repository.add(record).await {
            Ok(stored) => stored,
            Err(AppError::DuplicateContent(_)) => {
                tracing::debug!("Concurrent ingestion stored this content first");
                self.discard_backup(&backup_path).await;
                return Ok(IngestOutcome::duplicate());
            }
            Err(err) => return Err(err),
        };
        self.repository.commit().await?;

        tracing::info!(
            file_id = %stored.id,
            backup_path = %stored.backup_path,
            acquirer = %stored.acquirer_type,
            "File received"
        );
        Ok(IngestOutcome::accepted(stored.to_summary()))
    }

    /// Persist a NotReceived record for a failed attempt. Secondary failures
    /// are logged and dropped.
    async fn record_failure(
        &self,
        file: &UploadedFile,
        content: Bytes,
        acquirer: AcquirerType,
        error: &AppError,
    ) {
        let backup_path = match self.storage.save(&file.file_name, content).await {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!(error = %e, "Fallback backup failed; recording without backup");
                String::new()
            }
        };

        let record = NewFileRecord::not_received(
            file,
            backup_path,
            acquirer,
            error.to_string(),
            Utc::now(),
            self.failed_retention,
        );

        match self.repository.add(record).await {
            Ok(stored) => {
                if let Err(e) = self.repository.commit().await {
                    tracing::warn!(error = %e, "Fallback commit failed");
                    return;
                }
                tracing::info!(file_id = %stored.id, "File recorded as not received");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Fallback record could not be stored");
            }
        }
    }

    async fn discard_backup(&self, backup_path: &str) {
        if let Err(e) = self.storage.delete(backup_path).await {
            tracing::warn!(error = %e, backup_path = %backup_path, "Failed to remove unused backup");
        }
    }
}

fn log_failure(err: &AppError) {
    match err.log_level() {
        LogLevel::Debug => tracing::debug!(error = %err, code = err.error_code(), "Ingestion rejected"),
        LogLevel::Warn => tracing::warn!(error = %err, code = err.error_code(), "Ingestion rejected"),
        LogLevel::Error => tracing::error!(
            error = %err.detailed_message(),
            code = err.error_code(),
            "Ingestion failed"
        ),
    }
}
