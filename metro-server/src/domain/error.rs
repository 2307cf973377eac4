//! Domain error types.
//!
//! These errors represent malformed reference data. They are distinct from
//! store and cache I/O errors.

/// Domain-level errors for validation of reference data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// A holiday row whose `dayMonthYear` is not a valid `day,month,year`
    #[error("malformed holiday date: {0:?}")]
    MalformedHolidayDate(String),
}
