use serde::{Deserialize, Serialize};

/// Status counts and success ratio over all stored file records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total: i64,
    pub received: i64,
    pub not_received: i64,
    /// Percentage of received files, rounded half to even at 2 decimal places; 0 when
    /// there are no files.
    pub success_rate: f64,
}

/// Dashboard classification of the success rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Attention,
    Critical,
}

/// Statistics with their health classification, as shown on the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsReport {
    #[serde(flatten)]
    pub statistics: Statistics,
    pub health: HealthStatus,
}

impl From<Statistics> for StatisticsReport {
    fn from(statistics: Statistics) -> Self {
        let health = statistics.health();
        Self { statistics, health }
    }
}

impl Statistics {
    pub fn from_counts(received: i64, not_received: i64) -> Self {
        let total = received + not_received;
        let success_rate = if total > 0 {
            basis_points(received, total) as f64 / 100.0
        } else {
            0.0
        };

        Self {
            total,
            received,
            not_received,
            success_rate,
        }
    }

    pub fn health(&self) -> HealthStatus {
        if self.success_rate >= 80.0 {
            HealthStatus::Healthy
        } else if self.success_rate >= 50.0 {
            HealthStatus::Attention
        } else {
            HealthStatus::Critical
        }
    }
}

/// `received / total` in hundredths of a percent, rounded half to even.
fn basis_points(received: i64, total: i64) -> i64 {
    let scaled = received * 10_000;
    let (quotient, remainder) = (scaled / total, scaled % total);
    let twice = remainder * 2;
    if twice > total || (twice == total && quotient % 2 == 1) {
        quotient + 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ties_round_to_even() {
        assert_eq!(Statistics::from_counts(1, 799).success_rate, 0.12);
        assert_eq!(Statistics::from_counts(3, 797).success_rate, 0.38);
        assert_eq!(Statistics::from_counts(1, 2).success_rate, 33.33);
        assert_eq!(Statistics::from_counts(2, 1).success_rate, 66.67);
    }

    #[test]
    fn eighty_of_hundred() {
        let stats = Statistics::from_counts(80, 20);
        assert_eq!(stats.total, 100);
        assert_eq!(stats.success_rate, 80.0);
        assert_eq!(stats.health(), HealthStatus::Healthy);
    }

    #[test]
    fn empty_is_zero_not_nan() {
        let stats = Statistics::from_counts(0, 0);
        assert_eq!(stats.total, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.health(), HealthStatus::Critical);
    }

    #[test]
    fn rounds_to_two_decimals() {
        let stats = Statistics::from_counts(2, 1);
        assert_eq!(stats.success_rate, 66.67);
        assert_eq!(stats.health(), HealthStatus::Attention);

        let stats = Statistics::from_counts(1, 2);
        assert_eq!(stats.success_rate, 33.33);
    }

    #[test]
    fn report_flattens_counts() {
        let report = StatisticsReport::from(Statistics::from_counts(1, 1));
        assert_eq!(report.health, HealthStatus::Attention);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["total"], 2);
        assert_eq!(json["success_rate"], 50.0);
        assert_eq!(json["health"], "attention");
    }
}
