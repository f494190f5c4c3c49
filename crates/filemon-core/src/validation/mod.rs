//! Upload request validation
//!
//! Guards the outer surface before a file reaches the ingestion pipeline.
//! Whitespace-only content is not rejected here: the pipeline records it as a
//! failed ingestion.

use std::borrow::Cow;

use validator::{Validate, ValidationError};

use crate::AppError;

/// Characters that may not appear in an uploaded file name.
pub const RESERVED_FILE_NAME_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// An uploaded file as received from the outer surface.
#[derive(Debug, Clone, Validate)]
pub struct IngestRequest {
    #[validate(
        length(min = 1, max = 255, message = "File name is required and at most 255 characters"),
        custom(function = "validate_file_name")
    )]
    pub file_name: String,
    pub content: Vec<u8>,
}

impl IngestRequest {
    pub fn new(file_name: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content,
        }
    }

    /// Validate name and size against the configured upload limit.
    pub fn check(&self, max_file_size_bytes: usize) -> Result<(), AppError> {
        self.validate()?;

        if self.content.is_empty() {
            return Err(AppError::InvalidInput("File is empty".to_string()));
        }
        if self.content.len() > max_file_size_bytes {
            return Err(AppError::InvalidInput(format!(
                "File cannot be larger than {}MB",
                max_file_size_bytes / 1024 / 1024
            )));
        }
        Ok(())
    }
}

fn validate_file_name(file_name: &str) -> Result<(), ValidationError> {
    let invalid = file_name.trim().is_empty()
        || file_name
            .chars()
            .any(|c| c.is_control() || RESERVED_FILE_NAME_CHARS.contains(&c));

    if invalid {
        let mut err = ValidationError::new("invalid_file_name");
        err.message = Some(Cow::Borrowed("File name contains invalid characters"));
        return Err(err);
    }
    Ok(())
}
