use filemon_core::models::Statistics;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Cache key of the all-records summary.
pub const SUMMARY_KEY: &str = "statistics:summary";

const CAPACITY: usize = 16;

struct Entry {
    stored_at: Instant,
    value: Statistics,
}

/// Fixed-TTL cache of computed statistics.
///
/// Entries older than the TTL are treated as absent. Writers that change
/// record counts call `invalidate`.
pub struct StatisticsCache {
    entries: Mutex<LruCache<String, Entry>>,
    ttl: Duration,
}

impl StatisticsCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(
                NonZeroUsize::new(CAPACITY).unwrap_or(NonZeroUsize::MIN),
            )),
            ttl,
        }
    }

    fn entries(&self) -> MutexGuard<'_, LruCache<String, Entry>> {
        match self.entries.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Statistics> {
        let mut entries = self.entries();
        let fresh = entries
            .get(key)
            .map(|entry| entry.stored_at.elapsed() < self.ttl)?;

        if fresh {
            entries.get(key).map(|entry| entry.value.clone())
        } else {
            entries.pop(key);
            None
        }
    }

    pub fn insert(&self, key: &str, value: Statistics) {
        self.entries().put(
            key.to_string(),
            Entry {
                stored_at: Instant::now(),
                value,
            },
        );
    }

    pub fn invalidate(&self) {
        self.entries().clear();
        tracing::debug!("Statistics cache invalidated");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_fresh_entries() {
        let cache = StatisticsCache::new(Duration::from_secs(300));
        assert!(cache.get(SUMMARY_KEY).is_none());

        cache.insert(SUMMARY_KEY, Statistics::from_counts(3, 1));
        assert_eq!(cache.get(SUMMARY_KEY), Some(Statistics::from_counts(3, 1)));
    }

    #[test]
    fn expired_entries_are_dropped() {
        let cache = StatisticsCache::new(Duration::ZERO);
        cache.insert(SUMMARY_KEY, Statistics::from_counts(3, 1));
        assert!(cache.get(SUMMARY_KEY).is_none());
    }

    #[test]
    fn invalidate_clears_everything() {
        let cache = StatisticsCache::new(Duration::from_secs(300));
        cache.insert(SUMMARY_KEY, Statistics::from_counts(1, 0));
        cache.insert("other", Statistics::from_counts(0, 1));
        cache.invalidate();
        assert!(cache.get(SUMMARY_KEY).is_none());
        assert!(cache.get("other").is_none());
    }
}
