//! Station identifiers, positions and the station entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a row in the `stations` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct StationId(pub i64);

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when building a position from out-of-range coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid position: {reason}")]
pub struct InvalidPosition {
    reason: &'static str,
}

/// A WGS84 position in decimal degrees.
///
/// Positions built through [`Position::new`] are always finite and inside
/// the valid latitude/longitude ranges.
///
/// # Examples
///
/// ```
/// use metro_server::domain::Position;
///
/// let cacilhas = Position::new(-9.1486, 38.6877).unwrap();
/// assert_eq!(cacilhas.longitude(), -9.1486);
///
/// assert!(Position::new(-9.0, 91.0).is_err());
/// assert!(Position::new(181.0, 38.0).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    longitude: f64,
    latitude: f64,
}

impl Position {
    /// Create a position, rejecting non-finite or out-of-range coordinates.
    pub fn new(longitude: f64, latitude: f64) -> Result<Self, InvalidPosition> {
        if !longitude.is_finite() || !latitude.is_finite() {
            return Err(InvalidPosition {
                reason: "coordinates must be finite",
            });
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidPosition {
                reason: "longitude must be within -180..=180",
            });
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(InvalidPosition {
                reason: "latitude must be within -90..=90",
            });
        }
        Ok(Self {
            longitude,
            latitude,
        })
    }

    /// Longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude
    }
}

/// A station on the network.
///
/// Reference data: loaded once per process and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub longitude: f64,
    pub latitude: f64,
}

impl Station {
    /// The station's coordinates as a position.
    ///
    /// Coordinates come straight from the store and are not range-checked.
    pub fn position(&self) -> Position {
        Position {
            longitude: self.longitude,
            latitude: self.latitude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_boundaries() {
        assert!(Position::new(180.0, 90.0).is_ok());
        assert!(Position::new(-180.0, -90.0).is_ok());
        assert!(Position::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn rejects_non_finite() {
        assert!(Position::new(f64::NAN, 0.0).is_err());
        assert!(Position::new(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn rejects_out_of_range() {
        let err = Position::new(-9.0, 120.0).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid position: latitude must be within -90..=90"
        );
        assert!(Position::new(-200.0, 38.0).is_err());
    }

    #[test]
    fn station_position() {
        let station = Station {
            id: StationId(1),
            name: "Cacilhas".to_string(),
            longitude: -9.1486,
            latitude: 38.6877,
        };
        let pos = station.position();
        assert_eq!(pos.longitude(), -9.1486);
        assert_eq!(pos.latitude(), 38.6877);
    }

    #[test]
    fn station_id_display() {
        assert_eq!(StationId(17).to_string(), "17");
    }
}
