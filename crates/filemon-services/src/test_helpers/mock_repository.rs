use async_trait::async_trait;
use chrono::{DateTime, Utc};
use filemon_core::models::{FileRecord, FileStatus, NewFileRecord};
use filemon_core::AppError;
use filemon_db::FileRecordRepository;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Default)]
struct Counters {
    exists_calls: AtomicUsize,
    add_calls: AtomicUsize,
    delete_calls: AtomicUsize,
    commit_calls: AtomicUsize,
}

#[derive(Default)]
struct Faults {
    exists: AtomicBool,
    adds_remaining: AtomicUsize,
    deletes: AtomicBool,
    deletes_allowed: AtomicUsize,
    commits_remaining: AtomicUsize,
    hide_hashes: AtomicBool,
}

/// Mock file record repository for testing without database
///
/// Enforces content-hash uniqueness on `add` like the real schema does.
/// Clones share state.
#[derive(Clone, Default)]
pub struct MockFileRepository {
    records: Arc<Mutex<HashMap<Uuid, FileRecord>>>,
    counters: Arc<Counters>,
    faults: Arc<Faults>,
}

impl MockFileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a record directly, bypassing uniqueness checks and counters.
    pub fn insert(&self, record: FileRecord) {
        self.records.lock().unwrap().insert(record.id, record);
    }

    pub fn records(&self) -> Vec<FileRecord> {
        let mut records: Vec<FileRecord> = self.records.lock().unwrap().values().cloned().collect();
        records.sort_by(|a, b| b.received_at.cmp(&a.received_at));
        records
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn find_by_hash(&self, content_hash: &str) -> Option<FileRecord> {
        self.records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.content_hash == content_hash)
            .cloned()
    }

    pub fn exists_calls(&self) -> usize {
        self.counters.exists_calls.load(Ordering::SeqCst)
    }

    pub fn add_calls(&self) -> usize {
        self.counters.add_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.counters.delete_calls.load(Ordering::SeqCst)
    }

    pub fn commit_calls(&self) -> usize {
        self.counters.commit_calls.load(Ordering::SeqCst)
    }

    /// Make `exists_by_hash` fail.
    pub fn fail_exists(&self) {
        self.faults.exists.store(true, Ordering::SeqCst);
    }

    /// Make the next `n` calls to `add` fail.
    pub fn fail_adds(&self, n: usize) {
        self.faults.adds_remaining.store(n, Ordering::SeqCst);
    }

    /// Let the next `n` calls to `delete` succeed and fail every call after them.
    pub fn fail_deletes_after(&self, n: usize) {
        self.faults.deletes_allowed.store(n, Ordering::SeqCst);
        self.faults.deletes.store(true, Ordering::SeqCst);
    }

    /// Make the next `n` calls to `commit` fail.
    pub fn fail_commits(&self, n: usize) {
        self.faults.commits_remaining.store(n, Ordering::SeqCst);
    }

    /// Make `exists_by_hash` always answer false, as when a concurrent
    /// ingestion inserts between the check and the insert.
    pub fn hide_hashes_from_exists(&self) {
        self.faults.hide_hashes.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl FileRecordRepository for MockFileRepository {
    async fn exists_by_hash(&self, content_hash: &str) -> Result<bool, AppError> {
        self.counters.exists_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.exists.load(Ordering::SeqCst) {
            return Err(AppError::Internal("exists_by_hash unavailable".to_string()));
        }
        if self.faults.hide_hashes.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.find_by_hash(content_hash).is_some())
    }

    async fn add(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        self.counters.add_calls.fetch_add(1, Ordering::SeqCst);

        let failing = self
            .faults
            .adds_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Internal("insert rejected".to_string()));
        }

        let mut records = self.records.lock().unwrap();
        if records
            .values()
            .any(|r| r.content_hash == record.content_hash)
        {
            return Err(AppError::DuplicateContent(record.content_hash));
        }

        let stored = record.into_record(Uuid::new_v4());
        records.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned().map(|r| FileRecord {
            transactions: Vec::new(),
            ..r
        }))
    }

    async fn get_by_id_with_transactions(&self, id: Uuid) -> Result<Option<FileRecord>, AppError> {
        Ok(self.records.lock().unwrap().get(&id).cloned())
    }

    async fn list_expired(&self, as_of: DateTime<Utc>) -> Result<Vec<FileRecord>, AppError> {
        let mut expired: Vec<FileRecord> = self
            .records
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.is_expired(as_of))
            .cloned()
            .map(|r| FileRecord {
                transactions: Vec::new(),
                ..r
            })
            .collect();
        expired.sort_by_key(|r| r.expires_at);
        Ok(expired)
    }

    async fn delete(&self, record: &FileRecord) -> Result<(), AppError> {
        self.counters.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.faults.deletes.load(Ordering::SeqCst)
            && self
                .faults
                .deletes_allowed
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_err()
        {
            return Err(AppError::Internal("delete rejected".to_string()));
        }
        self.records.lock().unwrap().remove(&record.id);
        Ok(())
    }

    async fn count_by_status(&self) -> Result<HashMap<FileStatus, i64>, AppError> {
        let mut counts = HashMap::from([(FileStatus::Received, 0), (FileStatus::NotReceived, 0)]);
        for record in self.records.lock().unwrap().values() {
            *counts.entry(record.status).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn list_all_ordered_by_received_desc(&self) -> Result<Vec<FileRecord>, AppError> {
        Ok(self.records())
    }

    async fn commit(&self) -> Result<(), AppError> {
        self.counters.commit_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .faults
            .commits_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(AppError::Internal("commit rejected".to_string()));
        }
        Ok(())
    }
}
