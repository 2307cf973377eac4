//! Wall-clock snapshots in service-day terms.
//!
//! The timetable counts minutes from midnight of the *service day*, which
//! runs past midnight: departures between 00:00 and 04:59 belong to the
//! previous day's service and are stored with 1440 added (01:20 → 1520).

use std::fmt;

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Minutes in a calendar day.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// First hour that belongs to the current service day.
///
/// Hours `0..SERVICE_DAY_START_HOUR` are folded into the previous one.
pub const SERVICE_DAY_START_HOUR: u32 = 5;

/// A point in time captured once per query.
///
/// # Examples
///
/// ```
/// use metro_server::domain::TimeSnapshot;
/// use chrono::NaiveDate;
///
/// let at = NaiveDate::from_ymd_opt(2024, 3, 15)
///     .unwrap()
///     .and_hms_opt(1, 20, 0)
///     .unwrap();
/// let snapshot = TimeSnapshot::from_datetime(at);
/// assert_eq!(snapshot.service_minutes(), 1520);
/// assert_eq!(snapshot.day_of_week(), 5); // Friday
/// ```
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeSnapshot {
    date: NaiveDate,
    time: NaiveTime,
}

impl TimeSnapshot {
    /// Create a snapshot from date and time components.
    pub fn new(date: NaiveDate, time: NaiveTime) -> Self {
        Self { date, time }
    }

    /// Create a snapshot from a local date-time.
    pub fn from_datetime(at: NaiveDateTime) -> Self {
        Self {
            date: at.date(),
            time: at.time(),
        }
    }

    /// Returns the calendar date.
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// Day of month (1-31).
    pub fn day(&self) -> u32 {
        self.date.day()
    }

    /// Month (1-12).
    pub fn month(&self) -> u32 {
        self.date.month()
    }

    pub fn year(&self) -> i32 {
        self.date.year()
    }

    /// Day of week, 0 = Sunday through 6 = Saturday.
    pub fn day_of_week(&self) -> u32 {
        self.date.weekday().num_days_from_sunday()
    }

    /// Hour (0-23).
    pub fn hour(&self) -> u32 {
        self.time.hour()
    }

    /// Minute (0-59).
    pub fn minute(&self) -> u32 {
        self.time.minute()
    }

    pub fn second(&self) -> u32 {
        self.time.second()
    }

    /// Minutes since midnight of the service day.
    ///
    /// Ranges over `300..=1739`: 05:00 is 300, 23:59 is 1439, and
    /// 00:00-04:59 continue the previous day as 1440-1739.
    pub fn service_minutes(&self) -> u32 {
        let minutes = self.hour() * 60 + self.minute();
        if self.hour() < SERVICE_DAY_START_HOUR {
            minutes + MINUTES_PER_DAY
        } else {
            minutes
        }
    }
}

impl fmt::Debug for TimeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TimeSnapshot({} {:02}:{:02}:{:02})",
            self.date,
            self.hour(),
            self.minute(),
            self.second()
        )
    }
}

impl fmt::Display for TimeSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}:{:02}", self.date, self.hour(), self.minute())
    }
}

/// Source of the current local time.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// The device clock, in the process's local timezone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock stuck at one instant, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
