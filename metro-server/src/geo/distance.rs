//! Great-circle distance.

use crate::domain::Position;

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two positions, in kilometres.
///
/// # Examples
///
/// ```
/// use metro_server::domain::Position;
/// use metro_server::geo::haversine_km;
///
/// let cacilhas = Position::new(-9.1486, 38.6877).unwrap();
/// let corroios = Position::new(-9.1490, 38.6290).unwrap();
/// let d = haversine_km(cacilhas, corroios);
/// assert!((d - 6.53).abs() < 0.05);
/// ```
pub fn haversine_km(from: Position, to: Position) -> f64 {
    let lat1 = from.latitude().to_radians();
    let lat2 = to.latitude().to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (to.longitude() - from.longitude()).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair past 1 for antipodal points
    let a = a.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}
