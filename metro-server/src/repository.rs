//! Departure lookups with a short-lived query cache.
//!
//! Identical queries arriving within the TTL (same station, same minute,
//! same day type and season) are answered from memory. The cache key
//! carries the minute, so an entry can never return departures that were
//! already missed when the entry was written.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::domain::{Departure, StationId};
use crate::schedule::ScheduleContext;
use crate::store::{DepartureQuery, ReadinessGate, ScheduleStore, StoreError};

/// Cached result of one departure query.
type DepartureEntry = Arc<Vec<Departure>>;

/// Configuration for the departure cache.
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// TTL for cached query results. Zero disables caching.
    pub cache_ttl: Duration,

    /// Maximum number of cached query results.
    pub max_capacity: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

impl RepositoryConfig {
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

/// Departures for a station, served from the schedule store.
pub struct ScheduleRepository<S> {
    gate: ReadinessGate<S>,
    cache: Option<MokaCache<DepartureQuery, DepartureEntry>>,
}

impl<S: ScheduleStore> ScheduleRepository<S> {
    /// Create a repository reading through `gate`.
    pub fn new(gate: ReadinessGate<S>, config: &RepositoryConfig) -> Self {
        let cache = (!config.cache_ttl.is_zero()).then(|| {
            MokaCache::builder()
                .time_to_live(config.cache_ttl)
                .max_capacity(config.max_capacity)
                .build()
        });
        Self { gate, cache }
    }

    /// Departures from `station` still to come under `context`.
    ///
    /// Ordered by direction id, then by minutes since midnight. An empty
    /// result is not an error.
    pub async fn fetch_departures(
        &self,
        station: StationId,
        context: &ScheduleContext,
    ) -> Result<DepartureEntry, StoreError> {
        self.fetch(DepartureQuery::upcoming(station, context)).await
    }

    /// Run `query`, or answer it from the cache.
    pub async fn fetch(&self, query: DepartureQuery) -> Result<DepartureEntry, StoreError> {
        if let Some(cache) = &self.cache {
            if let Some(hit) = cache.get(&query).await {
                debug!(station = %query.station, from_minutes = query.from_minutes, "departure cache hit");
                return Ok(hit);
            }
        }

        let store = self.gate.wait().await?;
        let entry = Arc::new(store.departures(query).await?);

        // Failed queries are never cached
        if let Some(cache) = &self.cache {
            cache.insert(query, Arc::clone(&entry)).await;
        }
        Ok(entry)
    }

    /// Number of cached query results.
    pub fn cached_entries(&self) -> u64 {
        self.cache.as_ref().map_or(0, |c| c.entry_count())
    }

    /// Drop every cached query result.
    pub fn invalidate_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.invalidate_all();
        }
    }
}
