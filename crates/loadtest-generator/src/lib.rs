//! Simulated entity generator for the chbench load harness.
//!
//! This crate provides the `DataGenerator` which produces deterministic rows
//! for a use case. Every entity is built from a seed derived from the run seed
//! and its index, so runs with the same seed produce the same stream.
//!
//! # Architecture
//!
//! ```text
//! GeneratorConfig (use case, scale, seed, [start, end), interval)
//!        │
//!        ▼
//! ┌──────────────────────┐
//! │    DataGenerator     │
//! │                      │
//! │  - entities (scale)  │──── EntityFactory::new_entity(index, start)
//! │  - simulated clock   │
//! └──────────┬───────────┘
//!            │  rows() per entity, then tick_all(interval)
//!            ▼
//!    Row { table, timestamp, tags, fields }
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::{DateTime, Duration};
//! use loadtest_generator::{DataGenerator, GeneratorConfig, UseCase};
//!
//! let start = DateTime::from_timestamp(1_451_606_400, 0).unwrap();
//! let config = GeneratorConfig::new(UseCase::Devops, 2, start, start + Duration::seconds(60));
//!
//! let generator = DataGenerator::new(config).unwrap();
//! println!("header:\n{}", generator.header().render());
//! for row in generator.take(3) {
//!     println!("{row:?}");
//! }
//! ```
//!
//! # Use cases
//!
//! - `devops` - hosts with inventory tags and a `cpu` measurement
//! - `events` - user sessions with analytics events, `readings` and
//!   `diagnostics` measurements

pub mod distribution;
pub mod domains;
pub mod entity;
pub mod error;
pub mod generator;
pub mod measurement;
pub mod usecases;

// Re-exports for convenience
pub use entity::{Entity, Tag, TagProducer};
pub use error::GeneratorError;
pub use generator::{DataGenerator, GeneratorConfig};
pub use measurement::Measurement;
pub use usecases::{EntityFactory, UseCase};
