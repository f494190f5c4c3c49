//! Database repositories for data access layer
//
// File records and their transactions
pub mod file_record;
//
// Pool setup and embedded migrations
pub mod pool;
