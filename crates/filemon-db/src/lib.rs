//! Filemon Database Library
//!
//! The file record repository contract and its PostgreSQL implementation.

pub mod db;

pub use db::file_record::{FileRecordRepository, PostgresFileRecordRepository};
pub use db::pool::{create_pool, run_migrations};
