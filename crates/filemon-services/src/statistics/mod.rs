mod cache;
mod service;

pub use cache::{StatisticsCache, SUMMARY_KEY};
pub use service::StatisticsService;
