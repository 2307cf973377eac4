//! Read-through cache for the reference collections.
//!
//! Stations, directions and holidays change only when the database is
//! replaced. Each collection is resolved at most once per process:
//!
//! 1. the in-memory copy, if already populated;
//! 2. the persistent key-value store, if it holds an entry for the current
//!    data version that parses;
//! 3. the schedule store, after which the result is written back to the
//!    key-value store (best effort).
//!
//! Entries written under another data version are ignored, so bumping the
//! version refreshes every collection on the next process start.

use std::future::Future;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use crate::domain::Station;
use crate::schedule::{DirectionIndex, HolidayIndex};
use crate::store::{ReadinessGate, ScheduleStore, StoreError};

use super::kv::{KeyValueStore, KvError};

/// The three reference collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKey {
    Stations,
    Holidays,
    Directions,
}

impl ReferenceKey {
    /// Key under which the collection is persisted.
    pub fn as_str(self) -> &'static str {
        match self {
            ReferenceKey::Stations => "stations",
            ReferenceKey::Holidays => "holidays",
            ReferenceKey::Directions => "direction",
        }
    }
}

/// Persisted form of a collection.
#[derive(Debug, Serialize, Deserialize)]
struct CachedCollection<I> {
    /// Reference-data version the items were read under.
    data_version: String,
    /// Unix timestamp when the entry was written.
    cached_at_secs: u64,
    items: I,
}

/// Reference collections, populated once and then shared read-only.
pub struct ReferenceCache<S, K> {
    gate: ReadinessGate<S>,
    kv: K,
    data_version: String,
    stations: OnceCell<Arc<[Station]>>,
    directions: OnceCell<Arc<DirectionIndex>>,
    holidays: OnceCell<Arc<HolidayIndex>>,
}

impl<S: ScheduleStore, K: KeyValueStore> ReferenceCache<S, K> {
    /// Create an empty cache.
    ///
    /// `data_version` stamps persisted entries; entries with another stamp
    /// are treated as absent.
    pub fn new(gate: ReadinessGate<S>, kv: K, data_version: impl Into<String>) -> Self {
        Self {
            gate,
            kv,
            data_version: data_version.into(),
            stations: OnceCell::new(),
            directions: OnceCell::new(),
            holidays: OnceCell::new(),
        }
    }

    /// All stations, ordered by id.
    pub async fn stations(&self) -> Result<Arc<[Station]>, StoreError> {
        self.stations
            .get_or_try_init(|| async {
                let items = self
                    .read_through(ReferenceKey::Stations, |store| async move {
                        store.stations().await
                    })
                    .await?;
                info!(count = items.len(), "station list loaded");
                Ok::<_, StoreError>(Arc::from(items))
            })
            .await
            .map(Arc::clone)
    }

    /// All directions, indexed by id.
    pub async fn directions(&self) -> Result<Arc<DirectionIndex>, StoreError> {
        self.directions
            .get_or_try_init(|| async {
                let items = self
                    .read_through(ReferenceKey::Directions, |store| async move {
                        store.directions().await
                    })
                    .await?;
                let index = DirectionIndex::new(items);
                if index.is_empty() {
                    warn!("direction table is empty");
                }
                info!(count = index.len(), "directions loaded");
                Ok::<_, StoreError>(Arc::new(index))
            })
            .await
            .map(Arc::clone)
    }

    /// The holiday calendar.
    pub async fn holidays(&self) -> Result<Arc<HolidayIndex>, StoreError> {
        self.holidays
            .get_or_try_init(|| async {
                let items = self
                    .read_through(ReferenceKey::Holidays, |store| async move {
                        store.holidays().await
                    })
                    .await?;
                info!(count = items.len(), "holidays loaded");
                Ok::<_, StoreError>(Arc::new(HolidayIndex::new(&items)))
            })
            .await
            .map(Arc::clone)
    }

    /// Whether a collection is already held in memory.
    pub fn is_loaded(&self, key: ReferenceKey) -> bool {
        match key {
            ReferenceKey::Stations => self.stations.initialized(),
            ReferenceKey::Directions => self.directions.initialized(),
            ReferenceKey::Holidays => self.holidays.initialized(),
        }
    }

    async fn read_through<T, F, Fut>(&self, key: ReferenceKey, query: F) -> Result<Vec<T>, StoreError>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce(Arc<S>) -> Fut + Send,
        Fut: Future<Output = Result<Vec<T>, StoreError>> + Send,
    {
        if let Some(items) = self.read_persisted(key).await {
            debug!(key = key.as_str(), count = items.len(), "reference data from persistent cache");
            return Ok(items);
        }

        let store = self.gate.wait().await?;
        let items = query(store).await?;
        debug!(key = key.as_str(), count = items.len(), "reference data from store");

        if let Err(e) = self.write_persisted(key, &items).await {
            warn!(key = key.as_str(), error = %e, "failed to persist reference data");
        }
        Ok(items)
    }

    /// Read a persisted collection. Any failure reads as a miss.
    async fn read_persisted<T: DeserializeOwned>(&self, key: ReferenceKey) -> Option<Vec<T>> {
        let raw = match self.kv.get(key.as_str()).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "persistent cache read failed");
                return None;
            }
        };

        let cached: CachedCollection<Vec<T>> = match serde_json::from_str(&raw) {
            Ok(cached) => cached,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "discarding unreadable cache entry");
                return None;
            }
        };

        if cached.data_version != self.data_version {
            info!(
                key = key.as_str(),
                cached = %cached.data_version,
                current = %self.data_version,
                "discarding cache entry from another data version"
            );
            return None;
        }

        Some(cached.items)
    }

    async fn write_persisted<T: Serialize + Sync>(
        &self,
        key: ReferenceKey,
        items: &[T],
    ) -> Result<(), KvError> {
        let cached_at_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();

        let entry = CachedCollection {
            data_version: self.data_version.clone(),
            cached_at_secs,
            items,
        };
        let json = serde_json::to_string(&entry).map_err(|e| KvError::Serialize {
            key: key.as_str().to_string(),
            message: e.to_string(),
        })?;

        self.kv.set(key.as_str(), json).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Direction, DirectionId, Holiday, StationId};
    use crate::reference::MemoryKvStore;
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn station(id: i64, name: &str) -> Station {
        Station {
            id: StationId(id),
            name: name.to_string(),
            longitude: -9.15,
            latitude: 38.68,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![station(2, "Almada"), station(1, "Cacilhas")],
            vec![Direction {
                id: DirectionId(1),
                line_id: 1,
                source: "Cacilhas".to_string(),
                destination: "Corroios".to_string(),
                time_of_travel: 23,
            }],
            vec![Holiday {
                id: 1,
                day_month_year: "25,4,2024".to_string(),
                name: "Dia da Liberdade".to_string(),
            }],
            vec![],
        )
    }

    fn cache_with(
        store: MemoryStore,
        kv: MemoryKvStore,
        version: &str,
    ) -> (ReferenceCache<MemoryStore, MemoryKvStore>, ReadinessGate<MemoryStore>) {
        let gate = ReadinessGate::ready(store);
        (ReferenceCache::new(gate.clone(), kv, version), gate)
    }

    async fn calls(gate: &ReadinessGate<MemoryStore>) -> crate::store::StoreCalls {
        gate.wait().await.unwrap().calls()
    }

    #[tokio::test]
    async fn repeated_requests_hit_store_once() {
        let (cache, gate) = cache_with(store(), MemoryKvStore::new(), "1");

        for _ in 0..3 {
            let stations = cache.stations().await.unwrap();
            assert_eq!(stations.len(), 2);
            assert_eq!(stations[0].name, "Cacilhas");
            cache.directions().await.unwrap();
            cache.holidays().await.unwrap();
        }

        let calls = calls(&gate).await;
        assert_eq!(calls.stations, 1);
        assert_eq!(calls.directions, 1);
        assert_eq!(calls.holidays, 1);
        assert!(cache.is_loaded(ReferenceKey::Stations));
    }

    #[tokio::test]
    async fn concurrent_first_requests_populate_once() {
        let (cache, gate) = cache_with(store(), MemoryKvStore::new(), "1");

        let (a, b, c) = tokio::join!(cache.stations(), cache.stations(), cache.stations());
        assert!(a.is_ok() && b.is_ok() && c.is_ok());

        assert_eq!(calls(&gate).await.stations, 1);
    }

    #[tokio::test]
    async fn store_results_are_persisted() {
        let kv = MemoryKvStore::new();
        let (cache, _gate) = cache_with(store(), kv, "1");

        cache.stations().await.unwrap();

        let raw = cache.kv.get("stations").await.unwrap().unwrap();
        let entry: CachedCollection<Vec<Station>> = serde_json::from_str(&raw).unwrap();
        assert_eq!(entry.data_version, "1");
        assert_eq!(entry.items.len(), 2);
    }

    #[tokio::test]
    async fn persisted_entry_skips_store() {
        // Populate the persistent cache through one process...
        let (first, _gate) = cache_with(store(), MemoryKvStore::new(), "1");
        first.stations().await.unwrap();
        first.directions().await.unwrap();
        first.holidays().await.unwrap();
        let kv = first.kv;

        // ...and read it from a fresh one.
        let (second, gate) = cache_with(store(), kv, "1");
        assert_eq!(second.stations().await.unwrap().len(), 2);
        assert_eq!(second.directions().await.unwrap().len(), 1);
        let holidays = second.holidays().await.unwrap();
        assert!(holidays.contains(NaiveDate::from_ymd_opt(2024, 4, 25).unwrap()));

        assert_eq!(calls(&gate).await, crate::store::StoreCalls::default());
    }

    #[tokio::test]
    async fn other_data_version_is_refreshed() {
        let (first, _gate) = cache_with(store(), MemoryKvStore::new(), "1");
        first.stations().await.unwrap();
        let kv = first.kv;

        let (second, gate) = cache_with(store(), kv, "2");
        second.stations().await.unwrap();

        assert_eq!(calls(&gate).await.stations, 1);
        let raw = second.kv.get("stations").await.unwrap().unwrap();
        assert!(raw.contains("\"data_version\":\"2\""));
    }

    #[tokio::test]
    async fn unreadable_entry_falls_through_to_store() {
        let kv = MemoryKvStore::new();
        kv.set("stations", "{not json".to_string()).await.unwrap();
        let (cache, gate) = cache_with(store(), kv, "1");

        assert_eq!(cache.stations().await.unwrap().len(), 2);
        assert_eq!(calls(&gate).await.stations, 1);
    }

    /// Key-value store whose every operation fails.
    #[derive(Default)]
    struct BrokenKv {
        writes: AtomicUsize,
    }

    impl KeyValueStore for BrokenKv {
        async fn get(&self, key: &str) -> Result<Option<String>, KvError> {
            Err(KvError::Io {
                key: key.to_string(),
                source: std::io::Error::other("read-only filesystem"),
            })
        }

        async fn set(&self, key: &str, _value: String) -> Result<(), KvError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(KvError::Io {
                key: key.to_string(),
                source: std::io::Error::other("read-only filesystem"),
            })
        }
    }

    #[tokio::test]
    async fn persistent_cache_failures_do_not_fail_reads() {
        let gate = ReadinessGate::ready(store());
        let cache = ReferenceCache::new(gate.clone(), BrokenKv::default(), "1");

        assert_eq!(cache.stations().await.unwrap().len(), 2);
        assert_eq!(cache.stations().await.unwrap().len(), 2);

        assert_eq!(cache.kv.writes.load(Ordering::SeqCst), 1);
        assert_eq!(calls(&gate).await.stations, 1);
    }

    #[tokio::test]
    async fn failed_gate_surfaces_as_error() {
        let gate: ReadinessGate<MemoryStore> = ReadinessGate::new();
        gate.fail("no database").unwrap();
        let cache = ReferenceCache::new(gate, MemoryKvStore::new(), "1");

        let err = cache.stations().await.unwrap_err();

        assert!(matches!(err, StoreError::NotReady(_)));
        assert!(!cache.is_loaded(ReferenceKey::Stations));
    }

    #[test]
    fn persisted_keys() {
        assert_eq!(ReferenceKey::Stations.as_str(), "stations");
        assert_eq!(ReferenceKey::Holidays.as_str(), "holidays");
        assert_eq!(ReferenceKey::Directions.as_str(), "direction");
    }
}
