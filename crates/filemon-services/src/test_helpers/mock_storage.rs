use async_trait::async_trait;
use bytes::Bytes;
use filemon_storage::{MemoryStorage, Storage, StorageBackend, StorageError, StorageResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default)]
struct State {
    saves_remaining_to_fail: AtomicUsize,
    fail_deletes: AtomicBool,
    save_calls: AtomicUsize,
    delete_calls: AtomicUsize,
}

/// Memory storage with injectable save and delete failures.
#[derive(Clone, Default)]
pub struct FailingStorage {
    inner: MemoryStorage,
    state: Arc<State>,
}

impl FailingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` saves fail.
    pub fn fail_saves(&self, n: usize) {
        self.state.saves_remaining_to_fail.store(n, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.state.fail_deletes.store(true, Ordering::SeqCst);
    }

    pub fn save_calls(&self) -> usize {
        self.state.save_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> usize {
        self.state.delete_calls.load(Ordering::SeqCst)
    }

    /// Keys currently stored, sorted.
    pub async fn keys(&self) -> Vec<String> {
        self.inner.keys().await
    }
}

#[async_trait]
impl Storage for FailingStorage {
    async fn save(&self, file_name: &str, data: Bytes) -> StorageResult<String> {
        self.state.save_calls.fetch_add(1, Ordering::SeqCst);
        let failing = self
            .state
            .saves_remaining_to_fail
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(StorageError::UploadFailed("disk full".to_string()));
        }
        self.inner.save(file_name, data).await
    }

    async fn read(&self, storage_key: &str) -> StorageResult<Bytes> {
        self.inner.read(storage_key).await
    }

    async fn delete(&self, storage_key: &str) -> StorageResult<()> {
        self.state.delete_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::DeleteFailed(storage_key.to_string()));
        }
        self.inner.delete(storage_key).await
    }

    async fn exists(&self, storage_key: &str) -> StorageResult<bool> {
        self.inner.exists(storage_key).await
    }

    fn backend_type(&self) -> StorageBackend {
        self.inner.backend_type()
    }
}
