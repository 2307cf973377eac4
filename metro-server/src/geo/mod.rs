//! Locating the rider: position fixes and nearest-station search.

mod distance;
mod nearest;
mod source;

pub use distance::{EARTH_RADIUS_KM, haversine_km};
pub use nearest::{LocateError, Nearest, nearest_station};
pub use source::{
    DEFAULT_FIX_TIMEOUT, FixError, FixOptions, GeolocationSource, ReportedFix, locate,
};
