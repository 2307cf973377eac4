//! Timed departures as returned by the schedules table.

use serde::{Deserialize, Serialize};

use super::{DirectionId, StationId};

/// One scheduled departure from a station.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Departure {
    pub id: i64,
    /// Display label, e.g. `"17:35"`.
    #[sqlx(rename = "time_hours")]
    pub hour_label: String,
    /// Service-day minutes since midnight (01:20 is stored as 1520).
    #[sqlx(rename = "time_minutes")]
    pub minutes: i64,
    #[sqlx(rename = "column")]
    pub sequence: i64,
    #[sqlx(rename = "directions_id")]
    pub direction_id: DirectionId,
    #[sqlx(rename = "stations_id")]
    pub station_id: StationId,
    #[sqlx(rename = "lines_id")]
    pub line_id: i64,
    #[sqlx(rename = "schedule_types_id")]
    pub season_type_id: i64,
    #[sqlx(rename = "day_types_id")]
    pub day_type_id: i64,
}

impl Departure {
    /// Minutes from `now` (service-day minutes) until this departure.
    ///
    /// Negative when the departure is already in the past.
    pub fn minutes_until(&self, now: u32) -> i64 {
        self.minutes - i64::from(now)
    }
}
