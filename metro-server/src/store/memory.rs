//! In-memory schedule store for tests and demos.
//!
//! Holds the four tables as vectors and counts every query, so callers can
//! check how often the store was actually reached.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::domain::{Departure, Direction, Holiday, Station};

use super::{DepartureQuery, ScheduleStore, StoreError};

/// Number of queries served per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreCalls {
    pub stations: usize,
    pub directions: usize,
    pub holidays: usize,
    pub departures: usize,
}

/// Schedule store backed by vectors.
#[derive(Debug, Default)]
pub struct MemoryStore {
    stations: Vec<Station>,
    directions: Vec<Direction>,
    holidays: Vec<Holiday>,
    departures: Vec<Departure>,
    station_calls: AtomicUsize,
    direction_calls: AtomicUsize,
    holiday_calls: AtomicUsize,
    departure_calls: AtomicUsize,
    departures_down: AtomicBool,
    holidays_down: AtomicBool,
}

impl MemoryStore {
    /// Create a store with the given tables.
    pub fn new(
        stations: Vec<Station>,
        directions: Vec<Direction>,
        holidays: Vec<Holiday>,
        departures: Vec<Departure>,
    ) -> Self {
        Self {
            stations,
            directions,
            holidays,
            departures,
            ..Self::default()
        }
    }

    /// Make every departure query fail until called with `false`.
    pub fn set_departures_down(&self, down: bool) {
        self.departures_down.store(down, Ordering::SeqCst);
    }

    /// Make every holiday query fail until called with `false`.
    pub fn set_holidays_down(&self, down: bool) {
        self.holidays_down.store(down, Ordering::SeqCst);
    }

    /// Query counts so far.
    pub fn calls(&self) -> StoreCalls {
        StoreCalls {
            stations: self.station_calls.load(Ordering::SeqCst),
            directions: self.direction_calls.load(Ordering::SeqCst),
            holidays: self.holiday_calls.load(Ordering::SeqCst),
            departures: self.departure_calls.load(Ordering::SeqCst),
        }
    }
}

impl ScheduleStore for MemoryStore {
    async fn stations(&self) -> Result<Vec<Station>, StoreError> {
        self.station_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.stations.clone();
        rows.sort_by_key(|s| s.id);
        Ok(rows)
    }

    async fn directions(&self) -> Result<Vec<Direction>, StoreError> {
        self.direction_calls.fetch_add(1, Ordering::SeqCst);
        let mut rows = self.directions.clone();
        rows.sort_by_key(|d| d.id);
        Ok(rows)
    }

    async fn holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        self.holiday_calls.fetch_add(1, Ordering::SeqCst);
        if self.holidays_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("holidays table offline".to_string()));
        }
        Ok(self.holidays.clone())
    }

    async fn departures(&self, query: DepartureQuery) -> Result<Vec<Departure>, StoreError> {
        self.departure_calls.fetch_add(1, Ordering::SeqCst);
        if self.departures_down.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("departures table offline".to_string()));
        }
        let mut rows: Vec<Departure> = self
            .departures
            .iter()
            .filter(|d| query.matches(d))
            .cloned()
            .collect();
        rows.sort_by_key(|d| (d.direction_id, d.minutes));
        Ok(rows)
    }
}
