//! Named, time-evolving measurements.

use crate::distribution::Distribution;
use bench_core::SampleValue;
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

/// A stateful value generator advanced by ticks.
///
/// Values are pulled with [`Measurement::values`]; reading never mutates state.
pub trait Measurement: Send + Sync {
    /// Table the measurement is written to.
    fn name(&self) -> &str;

    /// Field column names, in the order of [`Measurement::values`].
    fn field_keys(&self) -> Vec<String>;

    /// Simulated instant of the current values.
    fn timestamp(&self) -> DateTime<Utc>;

    /// Advance the simulated clock and every field by `d`.
    fn tick(&mut self, d: Duration);

    /// Current field values.
    fn values(&self) -> Vec<SampleValue>;
}

/// A measurement whose fields are each driven by a [`Distribution`].
pub struct DistributionMeasurement {
    name: &'static str,
    timestamp: DateTime<Utc>,
    fields: Vec<(&'static str, Box<dyn Distribution>)>,
    rng: StdRng,
}

impl DistributionMeasurement {
    pub fn new(
        name: &'static str,
        start: DateTime<Utc>,
        seed: u64,
        fields: Vec<(&'static str, Box<dyn Distribution>)>,
    ) -> Self {
        Self {
            name,
            timestamp: start,
            fields,
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Measurement for DistributionMeasurement {
    fn name(&self) -> &str {
        self.name
    }

    fn field_keys(&self) -> Vec<String> {
        self.fields.iter().map(|(key, _)| key.to_string()).collect()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn tick(&mut self, d: Duration) {
        self.timestamp = advance(self.timestamp, d);
        for (_, distribution) in &mut self.fields {
            distribution.advance(&mut self.rng);
        }
    }

    fn values(&self) -> Vec<SampleValue> {
        self.fields
            .iter()
            .map(|(_, distribution)| SampleValue::Float64(distribution.get()))
            .collect()
    }
}

/// Add a std duration to an instant, saturating at the representable maximum.
pub(crate) fn advance(instant: DateTime<Utc>, d: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(d)
        .ok()
        .and_then(|delta| instant.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
