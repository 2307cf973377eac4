//! Schedule resolution: which timetable applies now, and how its
//! departures are presented per direction.

mod classify;
mod grouping;
mod holidays;

pub use classify::{DayType, ScheduleContext, SeasonType, classify};
pub use grouping::{DirectionGroup, DirectionIndex, GroupingError, group_by_direction};
pub use holidays::HolidayIndex;
