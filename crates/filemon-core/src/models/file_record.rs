use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::transaction::TransactionRecord;

/// Ingestion status of a file. Terminal once the record is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "file_status", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Received,
    NotReceived,
}

impl FileStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileStatus::Received => "received",
            FileStatus::NotReceived => "not_received",
        }
    }
}

impl std::fmt::Display for FileStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Card acquirer that produced a settlement file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "acquirer_type", rename_all = "snake_case")
)]
#[serde(rename_all = "snake_case")]
pub enum AcquirerType {
    UfCard,
    FagammonCard,
}

impl AcquirerType {
    pub fn company_name(&self) -> &'static str {
        match self {
            AcquirerType::UfCard => "UfCard",
            AcquirerType::FagammonCard => "FagammonCard",
        }
    }

    /// Resolve the acquirer from a parsed company field.
    ///
    /// Only the primary acquirer is matched; any other name maps to `FagammonCard`.
    pub fn from_company(company: &str) -> Self {
        if company
            .to_lowercase()
            .contains(&AcquirerType::UfCard.company_name().to_lowercase())
        {
            AcquirerType::UfCard
        } else {
            AcquirerType::FagammonCard
        }
    }
}

impl std::fmt::Display for AcquirerType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.company_name())
    }
}

/// Metadata and lifecycle state of one ingested file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileRecord {
    pub id: Uuid,
    pub file_name: String,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: FileStatus,
    pub backup_path: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub acquirer_type: AcquirerType,
    pub error_message: Option<String>,
    /// Loaded only by the queries that ask for transactions.
    pub transactions: Vec<TransactionRecord>,
}

impl FileRecord {
    pub fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        matches!(self.expires_at, Some(expires_at) if expires_at <= as_of)
    }

    pub fn to_summary(&self) -> FileSummary {
        FileSummary {
            id: self.id,
            file_name: self.file_name.clone(),
            received_at: self.received_at,
            expires_at: self.expires_at,
            status: self.status,
            acquirer_type: self.acquirer_type,
            size_bytes: self.size_bytes,
            error_message: self.error_message.clone(),
            transaction_count: self.transactions.len(),
        }
    }

    pub fn into_detail(self) -> FileDetail {
        FileDetail {
            summary: self.to_summary(),
            backup_path: self.backup_path,
            content_hash: self.content_hash,
            transactions: self.transactions,
        }
    }
}

/// Name, digest and size of an uploaded file, shared by both ingestion outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_hash: String,
    pub size_bytes: i64,
}

/// A file record before the repository assigns its identity.
#[derive(Debug, Clone, PartialEq)]
pub struct NewFileRecord {
    pub file_name: String,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: FileStatus,
    pub backup_path: String,
    pub content_hash: String,
    pub size_bytes: i64,
    pub acquirer_type: AcquirerType,
    pub error_message: Option<String>,
    pub transactions: Vec<TransactionRecord>,
}

impl NewFileRecord {
    /// Successfully parsed file: carries its transactions and no error message.
    pub fn received(
        file: &UploadedFile,
        backup_path: String,
        acquirer_type: AcquirerType,
        transactions: Vec<TransactionRecord>,
        received_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            file_name: file.file_name.clone(),
            received_at,
            expires_at: Some(received_at + retention),
            status: FileStatus::Received,
            backup_path,
            content_hash: file.content_hash.clone(),
            size_bytes: file.size_bytes,
            acquirer_type,
            error_message: None,
            transactions,
        }
    }

    /// Failed ingestion: no transactions, the failure's message is kept.
    pub fn not_received(
        file: &UploadedFile,
        backup_path: String,
        acquirer_type: AcquirerType,
        error_message: String,
        received_at: DateTime<Utc>,
        retention: Duration,
    ) -> Self {
        Self {
            file_name: file.file_name.clone(),
            received_at,
            expires_at: Some(received_at + retention),
            status: FileStatus::NotReceived,
            backup_path,
            content_hash: file.content_hash.clone(),
            size_bytes: file.size_bytes,
            acquirer_type,
            error_message: Some(error_message),
            transactions: Vec::new(),
        }
    }

    pub fn into_record(self, id: Uuid) -> FileRecord {
        FileRecord {
            id,
            file_name: self.file_name,
            received_at: self.received_at,
            expires_at: self.expires_at,
            status: self.status,
            backup_path: self.backup_path,
            content_hash: self.content_hash,
            size_bytes: self.size_bytes,
            acquirer_type: self.acquirer_type,
            error_message: self.error_message,
            transactions: self.transactions,
        }
    }
}

/// Public projection of a file record, used in listings and ingestion results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileSummary {
    pub id: Uuid,
    pub file_name: String,
    pub received_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub status: FileStatus,
    pub acquirer_type: AcquirerType,
    pub size_bytes: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub transaction_count: usize,
}

/// A file record with its backup locator, digest and transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileDetail {
    #[serde(flatten)]
    pub summary: FileSummary,
    pub backup_path: String,
    pub content_hash: String,
    pub transactions: Vec<TransactionRecord>,
}
