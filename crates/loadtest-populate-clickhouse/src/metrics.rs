use serde::Serialize;
use std::time::Duration;

/// Counters for a load run or one worker's share of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadMetrics {
    /// Number of rows written.
    pub rows_loaded: u64,
    /// Number of field values written, excluding sample times.
    pub values_loaded: u64,
    /// Number of batches processed.
    pub batch_count: u64,
    /// Wall time of the run.
    pub total_duration: Duration,
}

impl LoadMetrics {
    /// Account for one processed batch.
    pub fn record(&mut self, values: u64, rows: u64) {
        self.values_loaded += values;
        self.rows_loaded += rows;
        self.batch_count += 1;
    }

    /// Fold another worker's counters into these. Durations are not summed:
    /// workers run concurrently.
    pub fn merge(&mut self, other: &LoadMetrics) {
        self.rows_loaded += other.rows_loaded;
        self.values_loaded += other.values_loaded;
        self.batch_count += other.batch_count;
        self.total_duration = self.total_duration.max(other.total_duration);
    }

    pub fn rows_per_second(&self) -> f64 {
        per_second(self.rows_loaded, self.total_duration)
    }

    pub fn values_per_second(&self) -> f64 {
        per_second(self.values_loaded, self.total_duration)
    }
}

fn per_second(count: u64, duration: Duration) -> f64 {
    if duration.as_secs_f64() > 0.0 {
        count as f64 / duration.as_secs_f64()
    } else {
        0.0
    }
}
