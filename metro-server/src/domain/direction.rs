//! Travel directions along a line.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Primary key of a row in the `directions` table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DirectionId(pub i64);

impl fmt::Display for DirectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One travel orientation of a line, e.g. "Cacilhas → Corroios".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Direction {
    pub id: DirectionId,
    #[sqlx(rename = "lines_id")]
    pub line_id: i64,
    pub source: String,
    pub destination: String,
    /// End-to-end travel time in minutes.
    pub time_of_travel: i64,
}

impl Direction {
    /// Human-readable label, `source → destination`.
    pub fn label(&self) -> String {
        format!("{} → {}", self.source, self.destination)
    }
}
