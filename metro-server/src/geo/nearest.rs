//! Nearest-station search.

use crate::domain::{Position, Station};

use super::distance::haversine_km;

/// Errors from nearest-station search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LocateError {
    /// No stations to choose from
    #[error("cannot find nearest station: station set is empty")]
    EmptyStationSet,
}

/// The station closest to a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Nearest<'a> {
    pub station: &'a Station,
    pub distance_km: f64,
}

/// Find the station closest to `position`.
///
/// A linear scan; the network has a few dozen stations. On equal
/// distances the station earliest in `stations` wins.
pub fn nearest_station(position: Position, stations: &[Station]) -> Result<Nearest<'_>, LocateError> {
    stations
        .iter()
        .map(|station| Nearest {
            station,
            distance_km: haversine_km(position, station.position()),
        })
        .min_by(|a, b| a.distance_km.total_cmp(&b.distance_km))
        .ok_or(LocateError::EmptyStationSet)
}
