//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::domain::{Departure, Station};
use crate::schedule::DirectionGroup;
use crate::service::{Resolution, StationDepartures};

/// Query string of a position-based lookup.
///
/// Both coordinates are optional; a missing pair means the client has no
/// position fix.
#[derive(Debug, Deserialize)]
pub struct NearRequest {
    /// Longitude in decimal degrees
    pub lng: Option<f64>,

    /// Latitude in decimal degrees
    pub lat: Option<f64>,
}

/// A station.
#[derive(Debug, Serialize)]
pub struct StationDto {
    pub id: i64,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl From<&Station> for StationDto {
    fn from(station: &Station) -> Self {
        Self {
            id: station.id.0,
            name: station.name.clone(),
            longitude: station.longitude,
            latitude: station.latitude,
        }
    }
}

/// Full station list.
#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationDto>,
}

impl StationsResponse {
    pub fn from_stations(stations: &[Station]) -> Self {
        Self {
            stations: stations.iter().map(StationDto::from).collect(),
        }
    }
}

/// One upcoming departure.
#[derive(Debug, Serialize)]
pub struct DepartureDto {
    pub id: i64,

    /// Display time, e.g. "17:35"
    pub time: String,

    /// Service-day minutes since midnight
    pub minutes_since_midnight: i64,

    /// Minutes from now until departure
    pub minutes_until: i64,

    pub sequence: i64,
}

impl DepartureDto {
    fn from_departure(departure: &Departure, now: u32) -> Self {
        Self {
            id: departure.id,
            time: departure.hour_label.clone(),
            minutes_since_midnight: departure.minutes,
            minutes_until: departure.minutes_until(now),
            sequence: departure.sequence,
        }
    }
}

/// Departures in one direction.
#[derive(Debug, Serialize)]
pub struct DirectionDto {
    pub direction_id: i64,
    pub line_id: i64,
    pub source: String,
    pub destination: String,

    /// "Source → Destination"
    pub label: String,

    /// End-to-end travel time in minutes
    pub time_of_travel: i64,

    pub departures: Vec<DepartureDto>,
}

impl DirectionDto {
    fn from_group(group: &DirectionGroup, now: u32) -> Self {
        let direction = &group.direction;
        Self {
            direction_id: group.direction_id.0,
            line_id: direction.line_id,
            source: direction.source.clone(),
            destination: direction.destination.clone(),
            label: direction.label(),
            time_of_travel: direction.time_of_travel,
            departures: group
                .departures
                .iter()
                .map(|d| DepartureDto::from_departure(d, now))
                .collect(),
        }
    }
}

/// Upcoming departures at one station.
#[derive(Debug, Serialize)]
pub struct DeparturesResponse {
    pub station: StationDto,

    /// Distance from the client's position, for position-based lookups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,

    /// Local time the query was answered for, "YYYY-MM-DD HH:MM"
    pub now: String,

    pub is_holiday: bool,
    pub day_type: i64,
    pub season: i64,
    pub service_minutes: u32,

    /// The schedule lookup failed; `directions` is empty because of it
    pub degraded: bool,

    pub directions: Vec<DirectionDto>,
}

impl From<&StationDepartures> for DeparturesResponse {
    fn from(result: &StationDepartures) -> Self {
        let now = result.context.service_minutes;
        Self {
            station: StationDto::from(&result.station),
            distance_km: result.distance_km,
            now: result.snapshot.to_string(),
            is_holiday: result.context.is_holiday,
            day_type: result.context.day_type.id(),
            season: result.context.season.id(),
            service_minutes: now,
            degraded: result.degraded,
            directions: result
                .groups
                .iter()
                .map(|g| DirectionDto::from_group(g, now))
                .collect(),
        }
    }
}

/// Response to a position-based lookup.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NearResponse {
    Departures(DeparturesResponse),
    ChooseStation {
        reason: String,
        stations: Vec<StationDto>,
    },
}

impl From<&Resolution> for NearResponse {
    fn from(resolution: &Resolution) -> Self {
        match resolution {
            Resolution::Departures(result) => NearResponse::Departures(result.into()),
            Resolution::ChooseStation { stations, reason } => NearResponse::ChooseStation {
                reason: reason.clone(),
                stations: stations.iter().map(StationDto::from).collect(),
            },
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
