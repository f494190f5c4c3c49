use filemon_core::AppError;

use crate::layout::LayoutViolation;

/// Failures of `parse_file`, from the coarsest to the most specific.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("File is empty or contains only whitespace.")]
    Empty,

    #[error(transparent)]
    Layout(#[from] LayoutViolation),

    /// All digits, but not a real calendar date.
    #[error("Invalid date format: {value}")]
    Format { value: String },
}

impl From<ParseError> for AppError {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Empty => AppError::EmptyInput,
            ParseError::Layout(violation) => AppError::Layout(violation.to_string()),
            err @ ParseError::Format { .. } => AppError::Format(err.to_string()),
        }
    }
}
