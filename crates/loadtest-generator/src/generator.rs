//! Simulation driver producing rows for every entity of a use case.

use crate::entity::Entity;
use crate::error::GeneratorError;
use crate::measurement::advance;
use crate::usecases::{DevopsFactory, EntityFactory, EventsFactory, IdentityPools, UseCase};
use bench_core::{Header, InterchangeWriter, Row};
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::io::Write;
use std::time::Duration;

/// Default number of known users for the events use case.
pub const DEFAULT_USER_POOL: usize = 200_000;
/// Default number of known tenants for the events use case.
pub const DEFAULT_TENANT_POOL: usize = 100;
/// Default simulated time between two samples of an entity.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Parameters of one simulation run.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub use_case: UseCase,
    /// Number of simulated entities.
    pub scale: u64,
    pub seed: u64,
    /// First simulated instant (inclusive).
    pub start: DateTime<Utc>,
    /// End of the simulation (exclusive).
    pub end: DateTime<Utc>,
    pub interval: Duration,
    pub user_pool: usize,
    pub tenant_pool: usize,
}

impl GeneratorConfig {
    pub fn new(use_case: UseCase, scale: u64, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            use_case,
            scale,
            seed: 0,
            start,
            end,
            interval: DEFAULT_INTERVAL,
            user_pool: DEFAULT_USER_POOL,
            tenant_pool: DEFAULT_TENANT_POOL,
        }
    }

    fn validate(&self) -> Result<(), GeneratorError> {
        if self.scale == 0 {
            return Err(GeneratorError::InvalidConfig(
                "scale must be at least 1".to_string(),
            ));
        }
        if self.end <= self.start {
            return Err(GeneratorError::InvalidConfig(format!(
                "end {} is not after start {}",
                self.end, self.start
            )));
        }
        if self.interval.is_zero() {
            return Err(GeneratorError::InvalidConfig(
                "interval must be positive".to_string(),
            ));
        }
        Ok(())
    }

    fn factory(&self) -> Result<Box<dyn EntityFactory>, GeneratorError> {
        Ok(match self.use_case {
            UseCase::Devops => Box::new(DevopsFactory::new(self.seed)),
            UseCase::Events => Box::new(EventsFactory::new(
                self.seed,
                IdentityPools::new(self.seed, self.user_pool, self.tenant_pool)?,
            )),
        })
    }
}

/// Deterministic simulation over `[start, end)`.
///
/// At each instant every entity contributes one row per measurement, after
/// which all entities tick by the configured interval. Iteration yields rows
/// lazily and ends once the simulated clock reaches `end`.
pub struct DataGenerator {
    config: GeneratorConfig,
    header: Header,
    entities: Vec<Entity>,
    pending: VecDeque<Row>,
    now: DateTime<Utc>,
    rows_emitted: u64,
}

impl DataGenerator {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let factory = config.factory()?;

        let entities: Vec<Entity> = (0..config.scale)
            .map(|index| factory.new_entity(index, config.start))
            .collect();
        let header = match entities.first() {
            Some(entity) => entity.header()?,
            None => {
                return Err(GeneratorError::InvalidConfig(
                    "no entities to simulate".to_string(),
                ))
            }
        };

        Ok(Self {
            now: config.start,
            config,
            header,
            entities,
            pending: VecDeque::new(),
            rows_emitted: 0,
        })
    }

    /// Header shared by every row of this run.
    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Simulated instant of the next batch of rows.
    pub fn current_time(&self) -> DateTime<Utc> {
        self.now
    }

    pub fn rows_emitted(&self) -> u64 {
        self.rows_emitted
    }

    /// Collect the rows of the current instant and advance the simulation.
    fn step(&mut self) -> bool {
        if self.now >= self.config.end {
            return false;
        }
        for entity in &mut self.entities {
            self.pending.extend(entity.rows());
        }
        for entity in &mut self.entities {
            entity.tick_all(self.config.interval);
        }
        self.now = advance(self.now, self.config.interval);
        true
    }

    /// Write the header and, lazily, up to `limit` rows. Returns rows written.
    pub fn write_to<W: Write>(
        &mut self,
        writer: &mut InterchangeWriter<W>,
        limit: Option<u64>,
    ) -> Result<u64, GeneratorError> {
        writer.write_header(&self.header)?;
        let mut written = 0;
        while limit.map_or(true, |limit| written < limit) {
            let Some(row) = self.next() else { break };
            writer.write_row(&row)?;
            written += 1;
        }
        Ok(written)
    }
}

impl Iterator for DataGenerator {
    type Item = Row;

    fn next(&mut self) -> Option<Self::Item> {
        while self.pending.is_empty() {
            if !self.step() {
                return None;
            }
        }
        let row = self.pending.pop_front()?;
        self.rows_emitted += 1;
        Some(row)
    }
}
