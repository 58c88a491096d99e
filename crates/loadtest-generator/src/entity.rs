//! Simulated entities: identity tags plus measurements.
//!
//! Identity ("who the entity is") is captured in [`TagProducer::Fixed`] values
//! at construction and never changes. Attributes describing "what it is doing
//! now" are re-evaluated each time a tag snapshot is taken, either from the
//! entity's simulated clock or by sampling.

use crate::measurement::{advance, Measurement};
use bench_core::{Header, InterchangeError, Row, SampleValue, SerializedType};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt;
use std::time::Duration;

/// Sampling function for a re-evaluated tag.
pub type SampleFn = Box<dyn Fn(&mut StdRng) -> SampleValue + Send + Sync>;

/// How a tag obtains its value.
pub enum TagProducer {
    /// Constant captured at entity construction.
    Fixed(SampleValue),
    /// The entity's current simulated instant, in seconds since epoch.
    SimulatedTime,
    /// Drawn afresh on every snapshot.
    Sampled(SampleFn),
}

impl fmt::Debug for TagProducer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            Self::SimulatedTime => f.write_str("SimulatedTime"),
            Self::Sampled(_) => f.write_str("Sampled(..)"),
        }
    }
}

/// Identity attribute of an entity.
#[derive(Debug)]
pub struct Tag {
    pub key: &'static str,
    pub serialized_type: SerializedType,
    pub producer: TagProducer,
}

impl Tag {
    pub fn fixed(key: &'static str, value: impl Into<SampleValue>) -> Self {
        let value = value.into();
        Self {
            key,
            serialized_type: value.serialized_type(),
            producer: TagProducer::Fixed(value),
        }
    }

    pub fn simulated_time(key: &'static str) -> Self {
        Self {
            key,
            serialized_type: SerializedType::Int64,
            producer: TagProducer::SimulatedTime,
        }
    }

    pub fn sampled<F>(key: &'static str, serialized_type: SerializedType, sample: F) -> Self
    where
        F: Fn(&mut StdRng) -> SampleValue + Send + Sync + 'static,
    {
        Self {
            key,
            serialized_type,
            producer: TagProducer::Sampled(Box::new(sample)),
        }
    }
}

/// A simulated object with identity tags and evolving measurements.
pub struct Entity {
    tags: Vec<Tag>,
    measurements: Vec<Box<dyn Measurement>>,
    now: DateTime<Utc>,
    rng: StdRng,
}

impl Entity {
    pub fn new(
        start: DateTime<Utc>,
        seed: u64,
        tags: Vec<Tag>,
        measurements: Vec<Box<dyn Measurement>>,
    ) -> Self {
        Self {
            tags,
            measurements,
            now: start,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn tags(&self) -> &[Tag] {
        &self.tags
    }

    pub fn measurements(&self) -> &[Box<dyn Measurement>] {
        &self.measurements
    }

    /// Current simulated instant.
    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Advance every measurement, and the entity clock, by `d`.
    pub fn tick_all(&mut self, d: Duration) {
        self.now = advance(self.now, d);
        for measurement in &mut self.measurements {
            measurement.tick(d);
        }
    }

    /// Evaluate every tag at the current instant, in declaration order.
    pub fn tag_snapshot(&mut self) -> Vec<(String, SampleValue)> {
        let now = self.now;
        let rng = &mut self.rng;
        self.tags
            .iter()
            .map(|tag| {
                let value = match &tag.producer {
                    TagProducer::Fixed(value) => value.clone(),
                    TagProducer::SimulatedTime => SampleValue::Int64(now.timestamp()),
                    TagProducer::Sampled(sample) => sample(&mut *rng),
                };
                (tag.key.to_string(), value)
            })
            .collect()
    }

    /// One row per measurement at the current instant.
    pub fn rows(&mut self) -> Vec<Row> {
        let mut rows = Vec::with_capacity(self.measurements.len());
        for i in 0..self.measurements.len() {
            let tags = self.tag_snapshot();
            let measurement = &self.measurements[i];
            rows.push(Row {
                table: measurement.name().to_string(),
                timestamp: measurement.timestamp(),
                tags,
                fields: measurement.values(),
            });
        }
        rows
    }

    /// Header describing this entity's tags and measurement tables.
    pub fn header(&self) -> Result<Header, InterchangeError> {
        let keys = self.tags.iter().map(|t| t.key.to_string()).collect();
        let types = self.tags.iter().map(|t| t.serialized_type).collect();
        let mut header = Header::new(keys, types)?;
        for measurement in &self.measurements {
            header.add_table(measurement.name(), measurement.field_keys());
        }
        Ok(header)
    }
}
