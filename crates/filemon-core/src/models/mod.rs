//! Data models for the application
//!
//! Ingested file records, the transactions extracted from them, and the
//! projections handed to callers.

mod file_record;
mod ingest;
mod statistics;
mod transaction;

pub use file_record::*;
pub use ingest::*;
pub use statistics::*;
pub use transaction::*;
