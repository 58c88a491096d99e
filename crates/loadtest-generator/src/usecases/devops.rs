//! Devops use case: hosts with fixed inventory tags and a `cpu` measurement.

use super::{seed_for_index, walk, EntityFactory};
use crate::entity::{Entity, Tag};
use crate::measurement::{DistributionMeasurement, Measurement};
use chrono::{DateTime, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, RngCore, SeedableRng};

const REGIONS: &[(&str, &[&str])] = &[
    ("us-east-1", &["us-east-1a", "us-east-1b", "us-east-1c", "us-east-1e"]),
    ("us-west-1", &["us-west-1a", "us-west-1b"]),
    ("us-west-2", &["us-west-2a", "us-west-2b", "us-west-2c"]),
    ("eu-west-1", &["eu-west-1a", "eu-west-1b", "eu-west-1c"]),
    ("eu-central-1", &["eu-central-1a", "eu-central-1b"]),
    ("ap-southeast-1", &["ap-southeast-1a", "ap-southeast-1b"]),
    ("ap-southeast-2", &["ap-southeast-2a", "ap-southeast-2b"]),
    ("ap-northeast-1", &["ap-northeast-1a", "ap-northeast-1c"]),
    ("sa-east-1", &["sa-east-1a", "sa-east-1b", "sa-east-1c"]),
];

const OS: &[&str] = &["Ubuntu16.10", "Ubuntu16.04LTS", "Ubuntu15.10"];
const ARCH: &[&str] = &["x64", "x86"];
const TEAM: &[&str] = &["SF", "NYC", "LON", "CHI"];
const SERVICE_ENVIRONMENT: &[&str] = &["production", "staging", "test"];

const CPU_FIELDS: &[&str] = &[
    "usage_user",
    "usage_system",
    "usage_idle",
    "usage_nice",
    "usage_iowait",
    "usage_irq",
    "usage_softirq",
    "usage_steal",
    "usage_guest",
    "usage_guest_nice",
];

/// Builds `host_<index>` entities.
#[derive(Debug, Clone)]
pub struct DevopsFactory {
    seed: u64,
}

impl DevopsFactory {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

fn pick<R: Rng + ?Sized>(rng: &mut R, choices: &[&'static str]) -> &'static str {
    choices.choose(rng).copied().unwrap_or_default()
}

impl EntityFactory for DevopsFactory {
    fn new_entity(&self, index: u64, start: DateTime<Utc>) -> Entity {
        let seed = seed_for_index(self.seed, index);
        let mut rng = StdRng::seed_from_u64(seed);

        let (region, datacenters) = REGIONS[rng.gen_range(0..REGIONS.len())];
        let tags = vec![
            Tag::fixed("hostname", format!("host_{index}")),
            Tag::fixed("region", region),
            Tag::fixed("datacenter", pick(&mut rng, datacenters)),
            Tag::fixed("rack", rng.gen_range(0..100).to_string()),
            Tag::fixed("os", pick(&mut rng, OS)),
            Tag::fixed("arch", pick(&mut rng, ARCH)),
            Tag::fixed("team", pick(&mut rng, TEAM)),
            Tag::fixed("service", rng.gen_range(0..20).to_string()),
            Tag::fixed("service_version", rng.gen_range(0..2).to_string()),
            Tag::fixed("service_environment", pick(&mut rng, SERVICE_ENVIRONMENT)),
        ];

        let fields = CPU_FIELDS
            .iter()
            .map(|field| (*field, walk(&mut rng, 1.0, 0.0, 100.0)))
            .collect();
        let cpu = DistributionMeasurement::new("cpu", start, rng.next_u64(), fields);

        Entity::new(start, seed, tags, vec![Box::new(cpu) as Box<dyn Measurement>])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bench_core::{SampleValue, SerializedType};
    use std::time::Duration;

    fn start() -> DateTime<Utc> {
        DateTime::from_timestamp(1_451_606_400, 0).unwrap()
    }

    #[test]
    fn test_host_header() {
        let host = DevopsFactory::new(1).new_entity(0, start());
        let header = host.header().unwrap();

        assert_eq!(header.primary_tag(), Some("hostname"));
        assert_eq!(header.tag_keys().len(), 10);
        assert!(header
            .tag_types()
            .iter()
            .all(|t| *t == SerializedType::String));
        assert_eq!(header.table("cpu").unwrap().fields.len(), 10);
    }

    #[test]
    fn test_host_identity_is_deterministic() {
        let factory = DevopsFactory::new(99);
        let mut a = factory.new_entity(3, start());
        let mut b = factory.new_entity(3, start());
        assert_eq!(a.tag_snapshot(), b.tag_snapshot());
        assert_eq!(a.tag_snapshot()[0].1, SampleValue::from("host_3"));
    }

    #[test]
    fn test_datacenter_belongs_to_region() {
        let factory = DevopsFactory::new(5);
        for index in 0..50 {
            let mut host = factory.new_entity(index, start());
            let tags = host.tag_snapshot();
            let (SampleValue::String(region), SampleValue::String(dc)) = (&tags[1].1, &tags[2].1)
            else {
                panic!("Expected string tags, got {tags:?}");
            };
            assert!(dc.starts_with(region.as_str()));
        }
    }

    #[test]
    fn test_cpu_usage_in_range_after_ticks() {
        let mut host = DevopsFactory::new(1).new_entity(0, start());
        for _ in 0..100 {
            host.tick_all(Duration::from_secs(10));
        }
        for row in host.rows() {
            for value in row.fields {
                match value {
                    SampleValue::Float64(v) => assert!((0.0..=100.0).contains(&v)),
                    other => panic!("Expected Float64, got {other:?}"),
                }
            }
        }
    }
}
