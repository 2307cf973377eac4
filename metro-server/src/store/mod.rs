//! Read-only access to the schedule database.
//!
//! The database is pre-populated and never written by this crate. It is
//! opened asynchronously at startup; the [`ReadinessGate`] hands the open
//! store to every component that needs it, once it exists.

mod memory;
mod readiness;
mod sqlite;

use std::future::Future;

use crate::domain::{Departure, Direction, Holiday, Station, StationId};
use crate::schedule::{DayType, ScheduleContext, SeasonType};

pub use memory::{MemoryStore, StoreCalls};
pub use readiness::{GateError, ReadinessGate, resolve_with};
pub use sqlite::{SqliteStore, StoreConfig, spawn_bootstrap};

/// Errors from the schedule store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The database could not be opened
    #[error("failed to open schedule database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: sqlx::Error,
    },

    /// A query failed
    #[error("schedule query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The store never became ready
    #[error("schedule database not ready: {0}")]
    NotReady(#[from] GateError),

    /// The store is unreachable for another reason
    #[error("schedule store unavailable: {0}")]
    Unavailable(String),
}

/// The predicate of a departure query.
///
/// Selects departures of one station, at or after a service-day minute,
/// for one day type and season.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DepartureQuery {
    pub station: StationId,
    pub from_minutes: u32,
    pub day_type: DayType,
    pub season: SeasonType,
}

impl DepartureQuery {
    /// Departures from `station` not yet missed under `context`.
    pub fn upcoming(station: StationId, context: &ScheduleContext) -> Self {
        Self {
            station,
            from_minutes: context.service_minutes,
            day_type: context.day_type,
            season: context.season,
        }
    }

    /// Whether a departure row satisfies this predicate.
    pub fn matches(&self, departure: &Departure) -> bool {
        departure.station_id == self.station
            && departure.minutes >= i64::from(self.from_minutes)
            && departure.day_type_id == self.day_type.id()
            && departure.season_type_id == self.season.id()
    }
}

/// Read access to the reference tables and the schedules table.
///
/// Results are ordered: stations and directions by id; departures by
/// direction id, then by minutes since midnight.
pub trait ScheduleStore: Send + Sync + 'static {
    fn stations(&self) -> impl Future<Output = Result<Vec<Station>, StoreError>> + Send;

    fn directions(&self) -> impl Future<Output = Result<Vec<Direction>, StoreError>> + Send;

    fn holidays(&self) -> impl Future<Output = Result<Vec<Holiday>, StoreError>> + Send;

    fn departures(
        &self,
        query: DepartureQuery,
    ) -> impl Future<Output = Result<Vec<Departure>, StoreError>> + Send;
}
