use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use filemon_core::models::IngestOutcome;
use filemon_core::{AppError, Config, ErrorMetadata, IngestRequest};
use filemon_services::{
    create_storage, CatalogService, FileRecordRepository, IngestionService,
    PostgresFileRecordRepository, RetentionService, StatisticsCache, StatisticsService, Storage,
};
use serde::Serialize;
use sqlx::PgPool;

/// Initialize tracing for the CLI binary.
///
/// Logs go to stderr so command output on stdout stays valid JSON.
/// `LOG_FORMAT=json` switches to the JSON formatter.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("filemon=info"));

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

/// Services wired to one repository, one backup store and one statistics cache.
#[derive(Clone)]
pub struct Services {
    pub ingestion: IngestionService,
    pub retention: Arc<RetentionService>,
    pub statistics: StatisticsService,
    pub catalog: CatalogService,
}

impl Services {
    pub async fn build(config: &Config, pool: PgPool) -> anyhow::Result<Self> {
        let repository: Arc<dyn FileRecordRepository> =
            Arc::new(PostgresFileRecordRepository::new(pool));
        let storage: Arc<dyn Storage> = create_storage(config)
            .await
            .context("Failed to initialize backup storage")?;

        Ok(Self::with_collaborators(config, repository, storage))
    }

    pub fn with_collaborators(
        config: &Config,
        repository: Arc<dyn FileRecordRepository>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        let cache = Arc::new(StatisticsCache::new(config.stats_cache_ttl()));

        Self {
            ingestion: IngestionService::new(repository.clone(), storage.clone(), config)
                .with_statistics_cache(cache.clone()),
            retention: Arc::new(
                RetentionService::new(repository.clone(), storage.clone())
                    .with_statistics_cache(cache.clone()),
            ),
            statistics: StatisticsService::new(repository.clone()).with_cache(cache.clone()),
            catalog: CatalogService::new(repository, storage).with_statistics_cache(cache),
        }
    }
}

/// Outcome of one path passed to `filemon ingest`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestReport {
    pub path: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// Read and ingest one file. Unreadable or refused files yield a rejected report.
pub async fn ingest_path(ingestion: &IngestionService, path: &Path) -> IngestReport {
    let outcome = match tokio::fs::read(path).await {
        Ok(content) => {
            let request = IngestRequest::new(upload_name(path), content);
            match ingestion.ingest_request(request).await {
                Ok(outcome) => outcome,
                Err(err) => {
                    log_command_error(&err);
                    IngestOutcome::rejected(&err.client_message())
                }
            }
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Failed to read file");
            IngestOutcome::rejected(&format!("Failed to read {}: {}", path.display(), e))
        }
    };

    IngestReport {
        path: path.display().to_string(),
        outcome,
    }
}

/// Error body printed on stdout when a command fails.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    pub recoverable: bool,
}

impl From<&AppError> for ErrorReport {
    fn from(err: &AppError) -> Self {
        Self {
            success: false,
            code: err.error_code(),
            message: err.client_message(),
            recoverable: err.is_recoverable(),
        }
    }
}

/// Log a failed command. Sensitive details go to the log only.
pub fn log_command_error(err: &AppError) {
    if err.is_sensitive() {
        tracing::error!(
            error_type = err.error_type(),
            error = %err.detailed_message(),
            "Command failed"
        );
    } else {
        tracing::debug!(error_type = err.error_type(), error = %err, "Command refused");
    }
}

/// The name an uploaded file is recorded under: the last path component.
pub fn upload_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
