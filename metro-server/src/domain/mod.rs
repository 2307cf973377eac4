//! Domain types for the metro departures engine.
//!
//! Reference entities (stations, directions, holidays) mirror the tables
//! of the pre-populated schedule database. Types that can be invalid
//! (positions, holiday dates) are validated at construction time.

mod departure;
mod direction;
mod error;
mod holiday;
mod station;
mod time;

pub use departure::Departure;
pub use direction::{Direction, DirectionId};
pub use error::DomainError;
pub use holiday::Holiday;
pub use station::{InvalidPosition, Position, Station, StationId};
pub use time::{
    Clock, FixedClock, MINUTES_PER_DAY, SERVICE_DAY_START_HOUR, SystemClock, TimeSnapshot,
};
