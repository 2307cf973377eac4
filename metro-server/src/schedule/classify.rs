//! Day-type and season classification of a point in time.
//!
//! The timetable has one variant per (day type, season) pair. Which one is
//! in force depends only on the calendar date and the holiday list.

use serde::Serialize;

use crate::domain::TimeSnapshot;

use super::holidays::HolidayIndex;

/// Which weekly timetable applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Weekday,
    Saturday,
    SundayOrHoliday,
}

impl DayType {
    /// Classify from day of week (0 = Sunday) and holiday status.
    ///
    /// Holidays take the Sunday timetable regardless of weekday.
    pub fn for_day(day_of_week: u32, is_holiday: bool) -> Self {
        if day_of_week == 0 || is_holiday {
            DayType::SundayOrHoliday
        } else if day_of_week == 6 {
            DayType::Saturday
        } else {
            DayType::Weekday
        }
    }

    /// The `day_types_id` value used by the schedules table.
    pub fn id(self) -> i64 {
        match self {
            DayType::Weekday => 1,
            DayType::Saturday => 2,
            DayType::SundayOrHoliday => 3,
        }
    }
}

/// Which seasonal timetable applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonType {
    Winter,
    Summer,
}

impl SeasonType {
    /// Summer runs from July 15 through September 7 inclusive.
    ///
    /// `month` is 1-based.
    pub fn for_date(day: u32, month: u32) -> Self {
        let summer = (month == 7 && day > 14) || month == 8 || (month == 9 && day < 8);
        if summer {
            SeasonType::Summer
        } else {
            SeasonType::Winter
        }
    }

    /// The `schedule_types_id` value used by the schedules table.
    pub fn id(self) -> i64 {
        match self {
            SeasonType::Winter => 1,
            SeasonType::Summer => 2,
        }
    }
}

/// The timetable variant in force at a given instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ScheduleContext {
    pub is_holiday: bool,
    pub day_type: DayType,
    pub season: SeasonType,
    /// Service-day minutes since midnight; see [`TimeSnapshot::service_minutes`].
    pub service_minutes: u32,
}

/// Classify a snapshot against the holiday calendar.
pub fn classify(snapshot: &TimeSnapshot, holidays: &HolidayIndex) -> ScheduleContext {
    let is_holiday = holidays.contains(snapshot.date());
    ScheduleContext {
        is_holiday,
        day_type: DayType::for_day(snapshot.day_of_week(), is_holiday),
        season: SeasonType::for_date(snapshot.day(), snapshot.month()),
        service_minutes: snapshot.service_minutes(),
    }
}
