//! Tag identity cache: one surrogate id per distinct primary tag value.
//!
//! Resolution runs in three phases against a single reader/writer lock:
//!
//! 1. read lock: collect the distinct primary values with no mapping
//! 2. write lock: re-check them, allocate the next ids of the cache's
//!    sequence, persist the new identity rows as one insert and only then
//!    record the mappings
//! 3. read lock: resolve every row
//!
//! The write section is the only place ids are allocated, so two batches
//! racing on the same unseen value get one id between them. Mappings are
//! never evicted or reassigned; a failed persist records nothing.

use crate::error::LoaderError;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;
use tracing::debug;

/// Tag values of one row, in header order. The first is the primary value.
pub type TagValues<'a> = Vec<&'a str>;

/// A primary value seen for the first time, with the id allocated to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewIdentity<'a> {
    pub id: u32,
    /// Tag values of the first row carrying the primary value.
    pub tags: &'a [&'a str],
}

/// Durable side of identity allocation.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Persist all `identities` as one insert.
    async fn persist(&self, identities: &[NewIdentity<'_>]) -> Result<(), LoaderError>;
}

fn primary<'a>(tags: &[&'a str]) -> &'a str {
    tags.first().copied().unwrap_or_default()
}

/// Primary tag value to surrogate id map.
///
/// Ids follow the sequence `first, first + stride, ...` in allocation order.
#[derive(Debug)]
pub struct TagCache {
    ids: RwLock<HashMap<String, u32>>,
    first: u32,
    stride: u32,
}

impl Default for TagCache {
    fn default() -> Self {
        Self::new()
    }
}

impl TagCache {
    /// A cache allocating `1, 2, 3, ...`.
    pub fn new() -> Self {
        Self::partitioned(0, 1)
    }

    /// A cache for worker `worker` of `workers`, allocating
    /// `worker + 1, worker + 1 + workers, ...`.
    ///
    /// Private caches of one pool never hand out the same id.
    pub fn partitioned(worker: usize, workers: usize) -> Self {
        let stride = workers.max(1) as u32;
        Self {
            ids: RwLock::new(HashMap::new()),
            first: (worker as u32 % stride) + 1,
            stride,
        }
    }

    /// Number of mapped primary values.
    pub async fn len(&self) -> usize {
        self.ids.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.ids.read().await.is_empty()
    }

    pub async fn get(&self, value: &str) -> Option<u32> {
        self.ids.read().await.get(value).copied()
    }

    /// Resolve the surrogate id of every row, allocating and persisting ids
    /// for primary values not seen before.
    pub async fn resolve(
        &self,
        rows: &[TagValues<'_>],
        store: &dyn IdentityStore,
    ) -> Result<Vec<u32>, LoaderError> {
        let missing: Vec<usize> = {
            let ids = self.ids.read().await;
            let mut seen = HashSet::new();
            rows.iter()
                .enumerate()
                .filter(|(_, tags)| {
                    let value = primary(tags);
                    !ids.contains_key(value) && seen.insert(value)
                })
                .map(|(i, _)| i)
                .collect()
        };

        if !missing.is_empty() {
            let mut ids = self.ids.write().await;
            let mut next = self.first + ids.len() as u32 * self.stride;
            let mut fresh = Vec::with_capacity(missing.len());
            for i in missing {
                let tags = rows[i].as_slice();
                // Another batch may have mapped it since phase 1.
                if ids.contains_key(primary(tags)) {
                    continue;
                }
                fresh.push(NewIdentity { id: next, tags });
                next += self.stride;
            }

            if !fresh.is_empty() {
                store.persist(&fresh).await?;
                for identity in &fresh {
                    ids.insert(primary(identity.tags).to_string(), identity.id);
                }
                debug!(
                    "Allocated {} surrogate ids, cache holds {}",
                    fresh.len(),
                    ids.len()
                );
            }
        }

        let ids = self.ids.read().await;
        rows.iter()
            .map(|tags| {
                let value = primary(tags);
                ids.get(value)
                    .copied()
                    .ok_or_else(|| LoaderError::Unresolved(value.to_string()))
            })
            .collect()
    }
}
