//! In-memory collaborators for service tests
//!
//! These doubles allow testing the pipeline without a database or filesystem.

mod mock_repository;
mod mock_storage;

pub use mock_repository::MockFileRepository;
pub use mock_storage::FailingStorage;

use chrono::{Duration, Utc};
use filemon_core::models::{
    AcquirerType, FileRecord, NewFileRecord, RecordType, TransactionRecord, UploadedFile,
};
use uuid::Uuid;

pub const TYPE0_LINE: &str = "012345678902023010120230101202301310000001UfCard  ";
pub const TYPE1_LINE: &str = "12023010112345678FagammonCard0000002";

fn uploaded(name: &str) -> UploadedFile {
    UploadedFile {
        file_name: format!("{name}.txt"),
        content_hash: format!("hash-{name}"),
        size_bytes: 36,
    }
}

/// A stored Received record whose content hash is derived from `name`.
pub fn received_record(name: &str) -> FileRecord {
    let transaction = TransactionRecord {
        record_type: RecordType::Type1,
        establishment: "12345678".to_string(),
        processing_date: Utc::now().date_naive(),
        period_start: filemon_core::models::period_sentinel(),
        period_end: filemon_core::models::period_sentinel(),
        sequence: "0000002".to_string(),
        company: "FagammonCard".to_string(),
    };
    NewFileRecord::received(
        &uploaded(name),
        format!("backups/{name}.txt"),
        AcquirerType::FagammonCard,
        vec![transaction],
        Utc::now(),
        Duration::days(30),
    )
    .into_record(Uuid::new_v4())
}

/// A stored NotReceived record whose content hash is derived from `name`.
pub fn rejected_record(name: &str) -> FileRecord {
    NewFileRecord::not_received(
        &uploaded(name),
        format!("backups/{name}.txt"),
        AcquirerType::UfCard,
        "Invalid layout: the file line is empty.".to_string(),
        Utc::now(),
        Duration::days(7),
    )
    .into_record(Uuid::new_v4())
}
