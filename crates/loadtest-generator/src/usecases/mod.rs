//! Use cases: factories producing the simulated entities of one scenario.

mod devops;
mod events;

pub use devops::DevopsFactory;
pub use events::{EventsFactory, IdentityPools};

use crate::distribution::{ClampedRandomWalk, Distribution};
use crate::entity::Entity;
use crate::error::GeneratorError;
use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;
use std::str::FromStr;

/// Scenario selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UseCase {
    /// Hosts reporting CPU usage.
    Devops,
    /// User sessions emitting product-analytics events.
    Events,
}

impl UseCase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Devops => "devops",
            Self::Events => "events",
        }
    }
}

impl fmt::Display for UseCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UseCase {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "devops" => Ok(Self::Devops),
            "events" => Ok(Self::Events),
            _ => Err(GeneratorError::UnknownUseCase(s.to_string())),
        }
    }
}

/// Builds the entities of a use case.
///
/// `new_entity` is deterministic in `index`: the same factory yields the same
/// identity tags and initial measurement state for the same index.
pub trait EntityFactory: Send + Sync {
    fn new_entity(&self, index: u64, start: DateTime<Utc>) -> Entity;
}

/// Seed for the entity at `index`, so any entity can be built independently.
pub(crate) fn seed_for_index(base: u64, index: u64) -> u64 {
    base.wrapping_add(index.wrapping_mul(0x9E3779B97F4A7C15))
}

/// A clamped walk starting at a random point of its range.
pub(crate) fn walk<R: Rng + ?Sized>(
    rng: &mut R,
    step: f64,
    min: f64,
    max: f64,
) -> Box<dyn Distribution> {
    Box::new(ClampedRandomWalk::starting_anywhere(rng, step, min, max))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_use_case() {
        assert_eq!("devops".parse::<UseCase>().unwrap(), UseCase::Devops);
        assert_eq!("EVENTS".parse::<UseCase>().unwrap(), UseCase::Events);
        assert!(matches!(
            "iot".parse::<UseCase>(),
            Err(GeneratorError::UnknownUseCase(name)) if name == "iot"
        ));
    }

    #[test]
    fn test_seeds_differ_per_index() {
        assert_ne!(seed_for_index(42, 0), seed_for_index(42, 1));
        assert_eq!(seed_for_index(42, 7), seed_for_index(42, 7));
    }
}
