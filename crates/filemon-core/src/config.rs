//! Configuration module
//!
//! Database, backup storage, upload limits, retention periods and cache settings,
//! read from the environment (and `.env` through dotenvy).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::storage_types::StorageBackend;

const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const MAX_FILE_SIZE_MB: usize = 10;
const RETENTION_RECEIVED_DAYS: i64 = 30;
const RETENTION_FAILED_DAYS: i64 = 7;
const RETENTION_SWEEP_INTERVAL_SECS: u64 = 3600;
const STATS_CACHE_TTL_SECS: u64 = 300;
const BACKUP_PATH: &str = "./backups";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: String,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub storage_backend: StorageBackend,
    pub backup_path: String,
    pub max_file_size_bytes: usize,
    /// Days a successfully ingested file is kept before it becomes eligible for purge.
    pub retention_received_days: i64,
    /// Days a failed ingestion is kept.
    pub retention_failed_days: i64,
    /// 0 disables the background sweep.
    pub retention_sweep_interval_secs: u64,
    pub stats_cache_ttl_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            database_url: None,
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            storage_backend: StorageBackend::Local,
            backup_path: BACKUP_PATH.to_string(),
            max_file_size_bytes: MAX_FILE_SIZE_MB * 1024 * 1024,
            retention_received_days: RETENTION_RECEIVED_DAYS,
            retention_failed_days: RETENTION_FAILED_DAYS,
            retention_sweep_interval_secs: RETENTION_SWEEP_INTERVAL_SECS,
            stats_cache_ttl_secs: STATS_CACHE_TTL_SECS,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let storage_backend = match lookup("STORAGE_BACKEND") {
            Some(value) => StorageBackend::from_str(&value)?,
            None => defaults.storage_backend,
        };

        let max_file_size_mb = lookup("MAX_FILE_SIZE_MB")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(MAX_FILE_SIZE_MB);

        let config = Config {
            environment: lookup("ENVIRONMENT")
                .or_else(|| lookup("APP_ENV"))
                .unwrap_or(defaults.environment),
            database_url: lookup("DATABASE_URL").filter(|s| !s.trim().is_empty()),
            db_max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: lookup("DB_TIMEOUT_SECONDS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            storage_backend,
            backup_path: lookup("BACKUP_PATH").unwrap_or(defaults.backup_path),
            max_file_size_bytes: max_file_size_mb * 1024 * 1024,
            retention_received_days: lookup("RETENTION_RECEIVED_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETENTION_RECEIVED_DAYS),
            retention_failed_days: lookup("RETENTION_FAILED_DAYS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETENTION_FAILED_DAYS),
            retention_sweep_interval_secs: lookup("RETENTION_SWEEP_INTERVAL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(RETENTION_SWEEP_INTERVAL_SECS),
            stats_cache_ttl_secs: lookup("STATS_CACHE_TTL_SECS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(STATS_CACHE_TTL_SECS),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.max_file_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_FILE_SIZE_MB must be greater than 0"));
        }
        if self.retention_received_days <= 0 {
            return Err(anyhow::anyhow!(
                "RETENTION_RECEIVED_DAYS must be greater than 0"
            ));
        }
        if self.retention_failed_days <= 0 {
            return Err(anyhow::anyhow!("RETENTION_FAILED_DAYS must be greater than 0"));
        }
        if self.storage_backend == StorageBackend::Local && self.backup_path.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "BACKUP_PATH must be set when STORAGE_BACKEND=local"
            ));
        }
        Ok(())
    }

    pub fn require_database_url(&self) -> Result<&str, anyhow::Error> {
        self.database_url
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
    }

    pub fn received_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_received_days)
    }

    pub fn failed_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.retention_failed_days)
    }

    pub fn retention_sweep_interval(&self) -> Option<Duration> {
        if self.retention_sweep_interval_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.retention_sweep_interval_secs))
        }
    }

    pub fn stats_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_cache_ttl_secs)
    }
}
