//! Events use case: user sessions emitting product-analytics events.
//!
//! A session is the entity. Its `session_id`, `user_id` and `tenant_id` are
//! fixed at construction; `event_id`, `name` and both property payloads are
//! drawn again for every row, and `timestamp` follows the simulated clock.

use super::{seed_for_index, walk, EntityFactory};
use crate::domains::{get_random_event, random_property_map};
use crate::entity::{Entity, Tag};
use crate::error::GeneratorError;
use crate::measurement::{DistributionMeasurement, Measurement};
use bench_core::{SampleValue, SerializedType};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{RngCore, SeedableRng};
use std::sync::Arc;

pub const USER_PREFIX: &str = "u";
pub const TENANT_PREFIX: &str = "t";
pub const SESSION_PREFIX: &str = "s";
pub const EVENT_PREFIX: &str = "e";

const POOL_SEED_SALT: u64 = 0x5EED_1D5;

/// Known users and tenants that sessions are attributed to.
#[derive(Debug, Clone)]
pub struct IdentityPools {
    users: Arc<[String]>,
    tenants: Arc<[String]>,
}

impl IdentityPools {
    /// Mint `users` user ids and `tenants` tenant ids from `seed`.
    pub fn new(seed: u64, users: usize, tenants: usize) -> Result<Self, GeneratorError> {
        if users == 0 || tenants == 0 {
            return Err(GeneratorError::InvalidConfig(format!(
                "identity pools must not be empty (users={users}, tenants={tenants})"
            )));
        }
        let mut rng = StdRng::seed_from_u64(seed ^ POOL_SEED_SALT);
        let users = (0..users)
            .map(|_| publicid::generate_with_prefix(&mut rng, USER_PREFIX))
            .collect();
        let tenants = (0..tenants)
            .map(|_| publicid::generate_with_prefix(&mut rng, TENANT_PREFIX))
            .collect();
        Ok(Self { users, tenants })
    }

    pub fn users(&self) -> &[String] {
        &self.users
    }

    pub fn tenants(&self) -> &[String] {
        &self.tenants
    }
}

/// Builds session entities attributed to users and tenants from the pools.
#[derive(Debug, Clone)]
pub struct EventsFactory {
    seed: u64,
    pools: IdentityPools,
}

impl EventsFactory {
    pub fn new(seed: u64, pools: IdentityPools) -> Self {
        Self { seed, pools }
    }
}

fn readings<R: RngCore>(rng: &mut R, start: DateTime<Utc>) -> DistributionMeasurement {
    let fields = vec![
        ("latitude", walk(rng, 0.05, -90.0, 90.0)),
        ("longitude", walk(rng, 0.05, -180.0, 180.0)),
        ("elevation", walk(rng, 10.0, 0.0, 5000.0)),
        ("velocity", walk(rng, 1.0, 0.0, 100.0)),
        ("heading", walk(rng, 1.0, 0.0, 360.0)),
        ("grade", walk(rng, 5.0, 0.0, 100.0)),
        ("fuel_consumption", walk(rng, 1.0, 0.0, 50.0)),
    ];
    DistributionMeasurement::new("readings", start, rng.next_u64(), fields)
}

fn diagnostics<R: RngCore>(rng: &mut R, start: DateTime<Utc>) -> DistributionMeasurement {
    let fields = vec![
        ("fuel_state", walk(rng, 0.01, 0.0, 1.0)),
        ("current_load", walk(rng, 50.0, 0.0, 5000.0)),
        ("status", walk(rng, 1.0, 0.0, 5.0)),
    ];
    DistributionMeasurement::new("diagnostics", start, rng.next_u64(), fields)
}

impl EntityFactory for EventsFactory {
    fn new_entity(&self, index: u64, start: DateTime<Utc>) -> Entity {
        let seed = seed_for_index(self.seed, index);
        let mut rng = StdRng::seed_from_u64(seed);

        let session = publicid::generate_with_prefix(&mut rng, SESSION_PREFIX);
        let user = self.pools.users().choose(&mut rng).cloned().unwrap_or_default();
        let tenant = self
            .pools
            .tenants()
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default();

        let tags = vec![
            Tag::fixed("session_id", session),
            Tag::fixed("user_id", user),
            Tag::fixed("tenant_id", tenant),
            Tag::sampled("event_id", SerializedType::String, |rng| {
                SampleValue::String(publicid::generate_with_prefix(rng, EVENT_PREFIX))
            }),
            Tag::simulated_time("timestamp"),
            Tag::sampled("name", SerializedType::String, |rng| {
                SampleValue::from(get_random_event(rng))
            }),
            Tag::sampled("properties_map", SerializedType::String, |rng| {
                SampleValue::Map(random_property_map(rng))
            }),
            Tag::sampled("properties_json", SerializedType::String, |rng| {
                SampleValue::Json(random_property_map(rng))
            }),
        ];

        let measurements = vec![
            Box::new(readings(&mut rng, start)) as Box<dyn Measurement>,
            Box::new(diagnostics(&mut rng, start)) as Box<dyn Measurement>,
        ];

        Entity::new(start, seed, tags, measurements)
    }
}
