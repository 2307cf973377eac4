//! Holiday lookup by calendar date.

use std::collections::HashMap;

use chrono::NaiveDate;
use tracing::warn;

use crate::domain::Holiday;

/// Set of holiday dates with O(1) membership.
#[derive(Debug, Clone, Default)]
pub struct HolidayIndex {
    by_date: HashMap<NaiveDate, String>,
}

impl HolidayIndex {
    /// Build the index from holiday rows.
    ///
    /// Rows with an unparseable date are skipped with a warning; they
    /// can never match a real calendar day.
    pub fn new(holidays: &[Holiday]) -> Self {
        let by_date = holidays
            .iter()
            .filter_map(|h| match h.date() {
                Ok(date) => Some((date, h.name.clone())),
                Err(e) => {
                    warn!(holiday_id = h.id, error = %e, "skipping holiday row");
                    None
                }
            })
            .collect();
        Self { by_date }
    }

    /// Check whether `date` is a holiday.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.by_date.contains_key(&date)
    }

    /// Name of the holiday on `date`, if any.
    pub fn name_on(&self, date: NaiveDate) -> Option<&str> {
        self.by_date.get(&date).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.by_date.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_date.is_empty()
    }
}
