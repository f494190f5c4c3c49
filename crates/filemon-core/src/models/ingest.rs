use serde::{Deserialize, Serialize};

use super::file_record::FileSummary;

pub const ACCEPTED_MESSAGE: &str = "File processed successfully";
pub const DUPLICATE_MESSAGE: &str = "Duplicate file. This file has already been processed.";

/// How an ingestion attempt ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestOutcomeKind {
    /// Parsed and stored as Received.
    Accepted,
    /// Content already known; nothing was written.
    Duplicate,
    /// Processing failed; a NotReceived record was attempted.
    Rejected,
}

/// Result of one ingestion attempt as reported to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestOutcome {
    pub success: bool,
    pub kind: IngestOutcomeKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<FileSummary>,
}

impl IngestOutcome {
    pub fn accepted(file: FileSummary) -> Self {
        Self {
            success: true,
            kind: IngestOutcomeKind::Accepted,
            message: ACCEPTED_MESSAGE.to_string(),
            file: Some(file),
        }
    }

    pub fn duplicate() -> Self {
        Self {
            success: false,
            kind: IngestOutcomeKind::Duplicate,
            message: DUPLICATE_MESSAGE.to_string(),
            file: None,
        }
    }

    pub fn rejected(reason: &str) -> Self {
        Self {
            success: false,
            kind: IngestOutcomeKind::Rejected,
            message: format!("Failed to process file: {}", reason),
            file: None,
        }
    }
}
