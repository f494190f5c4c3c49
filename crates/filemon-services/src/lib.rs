//! Filemon Services Layer
//!
//! Orchestration over the repository and backup storage: the ingestion
//! pipeline, retention purge and sweep, statistics with their cache, and
//! catalog queries. The binary depends on this crate alone for behavior.

pub mod catalog;
pub mod ingestion;
pub mod retention;
pub mod statistics;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;

pub use catalog::CatalogService;
pub use ingestion::IngestionService;
pub use retention::RetentionService;
pub use statistics::{StatisticsCache, StatisticsService};

pub use filemon_db::{FileRecordRepository, PostgresFileRecordRepository};
pub use filemon_storage::{
    create_storage, LocalStorage, MemoryStorage, Storage, StorageBackend, StorageError,
    StorageResult,
};
