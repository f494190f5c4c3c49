//! Filemon Storage Library
//!
//! Backup storage for the raw bytes of every ingestion attempt. The `Storage`
//! trait is implemented by a local filesystem backend and an in-process
//! memory backend.
//!
//! # Backup key format
//!
//! `backups/{YYYYMMDD_HHMMSS}_{8 hex chars}_{sanitized file name}`
//!
//! The random segment keeps two uploads of the same name in the same second
//! apart. Keys must not contain `..` or a leading `/`. Key generation lives in
//! the `keys` module so every backend produces the same layout.

pub mod factory;
pub mod keys;
pub mod local;
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use filemon_core::StorageBackend;
pub use local::LocalStorage;
pub use memory::MemoryStorage;
pub use traits::{Storage, StorageError, StorageResult};
