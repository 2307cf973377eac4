//! Public holidays.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// A holiday row. The date is stored as `"day,month,year"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Holiday {
    pub id: i64,
    #[sqlx(rename = "dayMonthYear")]
    pub day_month_year: String,
    #[sqlx(rename = "nameOfHoliday")]
    pub name: String,
}

impl Holiday {
    /// Parse the `"day,month,year"` column into a calendar date.
    ///
    /// # Examples
    ///
    /// ```
    /// use metro_server::domain::Holiday;
    /// use chrono::NaiveDate;
    ///
    /// let holiday = Holiday {
    ///     id: 1,
    ///     day_month_year: "25,4,2024".to_string(),
    ///     name: "Dia da Liberdade".to_string(),
    /// };
    /// assert_eq!(holiday.date().unwrap(), NaiveDate::from_ymd_opt(2024, 4, 25).unwrap());
    /// ```
    pub fn date(&self) -> Result<NaiveDate, DomainError> {
        let malformed = || DomainError::MalformedHolidayDate(self.day_month_year.clone());

        let mut parts = self.day_month_year.split(',').map(str::trim);
        let day: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let month: u32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        let year: i32 = parts.next().and_then(|p| p.parse().ok()).ok_or_else(malformed)?;
        if parts.next().is_some() {
            return Err(malformed());
        }

        NaiveDate::from_ymd_opt(year, month, day).ok_or_else(malformed)
    }
}
