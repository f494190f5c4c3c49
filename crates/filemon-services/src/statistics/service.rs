use filemon_core::models::{FileStatus, Statistics, StatisticsReport};
use filemon_core::AppError;
use filemon_db::FileRecordRepository;
use std::sync::Arc;

use super::cache::{StatisticsCache, SUMMARY_KEY};

#[derive(Clone)]
pub struct StatisticsService {
    repository: Arc<dyn FileRecordRepository>,
    cache: Option<Arc<StatisticsCache>>,
}

impl StatisticsService {
    pub fn new(repository: Arc<dyn FileRecordRepository>) -> Self {
        Self {
            repository,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<StatisticsCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Status counts and success rate over all stored records.
    #[tracing::instrument(skip(self))]
    pub async fn summarize(&self) -> Result<Statistics, AppError> {
        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(SUMMARY_KEY)) {
            tracing::debug!("Statistics served from cache");
            return Ok(cached);
        }

        let counts = self.repository.count_by_status().await?;
        let statistics = Statistics::from_counts(
            counts.get(&FileStatus::Received).copied().unwrap_or(0),
            counts.get(&FileStatus::NotReceived).copied().unwrap_or(0),
        );

        if let Some(cache) = &self.cache {
            cache.insert(SUMMARY_KEY, statistics.clone());
        }

        tracing::debug!(
            total = statistics.total,
            success_rate = statistics.success_rate,
            "Statistics computed"
        );
        Ok(statistics)
    }

    pub async fn report(&self) -> Result<StatisticsReport, AppError> {
        Ok(self.summarize().await?.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{received_record, rejected_record, MockFileRepository};
    use filemon_core::models::HealthStatus;
    use std::time::Duration;

    #[tokio::test]
    async fn summarize_counts_by_status() {
        let repository = MockFileRepository::new();
        for i in 0..80 {
            repository.insert(received_record(&format!("ok-{i}")));
        }
        for i in 0..20 {
            repository.insert(rejected_record(&format!("bad-{i}")));
        }

        let service = StatisticsService::new(Arc::new(repository));
        let statistics = service.summarize().await.unwrap();
        assert_eq!(statistics.total, 100);
        assert_eq!(statistics.received, 80);
        assert_eq!(statistics.not_received, 20);
        assert_eq!(statistics.success_rate, 80.0);

        let report = service.report().await.unwrap();
        assert_eq!(report.health, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn empty_repository_has_zero_rate() {
        let service = StatisticsService::new(Arc::new(MockFileRepository::new()));
        let statistics = service.summarize().await.unwrap();
        assert_eq!(statistics.total, 0);
        assert_eq!(statistics.success_rate, 0.0);
    }

    #[tokio::test]
    async fn cache_hides_new_records_until_invalidated() {
        let repository = MockFileRepository::new();
        repository.insert(received_record("a"));
        let cache = Arc::new(StatisticsCache::new(Duration::from_secs(300)));
        let service =
            StatisticsService::new(Arc::new(repository.clone())).with_cache(cache.clone());

        assert_eq!(service.summarize().await.unwrap().total, 1);
        repository.insert(rejected_record("b"));
        assert_eq!(service.summarize().await.unwrap().total, 1);

        cache.invalidate();
        assert_eq!(service.summarize().await.unwrap().total, 2);
    }
}
