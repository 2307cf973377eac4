//! SQLite-backed schedule store.

use std::path::PathBuf;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::{debug, info, instrument};

use crate::domain::{Departure, Direction, Holiday, Station};

use super::readiness::{ReadinessGate, resolve_with};
use super::{DepartureQuery, ScheduleStore, StoreError};

const STATIONS_SQL: &str = "SELECT id, name, longitude, latitude FROM stations ORDER BY id ASC";

const DIRECTIONS_SQL: &str = "SELECT id, lines_id, source, destination, time_of_travel \
     FROM directions ORDER BY id ASC";

const HOLIDAYS_SQL: &str = "SELECT id, dayMonthYear, nameOfHoliday FROM holidays";

const DEPARTURES_SQL: &str = r#"SELECT id, time_hours, time_minutes, "column", directions_id,
       stations_id, lines_id, schedule_types_id, day_types_id
FROM schedules
WHERE stations_id = ?
  AND time_minutes >= ?
  AND day_types_id = ?
  AND schedule_types_id = ?
ORDER BY directions_id ASC, time_minutes ASC"#;

/// Configuration for opening the schedule database.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Path to the pre-populated SQLite file.
    pub path: PathBuf,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

impl StoreConfig {
    /// Create a config for the database at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            max_connections: 4,
        }
    }

    /// Set the pool size.
    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new("MTS.db")
    }
}

/// Schedule store over a read-only SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open the database read-only. The file must already exist.
    #[instrument(skip_all, fields(path = %config.path.display()))]
    pub async fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .read_only(true)
            .create_if_missing(false);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|source| StoreError::Open {
                path: config.path.display().to_string(),
                source,
            })?;

        info!(
            max_connections = config.max_connections,
            "schedule database opened"
        );
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl ScheduleStore for SqliteStore {
    async fn stations(&self) -> Result<Vec<Station>, StoreError> {
        let rows = sqlx::query_as::<_, Station>(STATIONS_SQL)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "queried stations");
        Ok(rows)
    }

    async fn directions(&self) -> Result<Vec<Direction>, StoreError> {
        let rows = sqlx::query_as::<_, Direction>(DIRECTIONS_SQL)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "queried directions");
        Ok(rows)
    }

    async fn holidays(&self) -> Result<Vec<Holiday>, StoreError> {
        let rows = sqlx::query_as::<_, Holiday>(HOLIDAYS_SQL)
            .fetch_all(&self.pool)
            .await?;
        debug!(count = rows.len(), "queried holidays");
        Ok(rows)
    }

    async fn departures(&self, query: DepartureQuery) -> Result<Vec<Departure>, StoreError> {
        let rows = sqlx::query_as::<_, Departure>(DEPARTURES_SQL)
            .bind(query.station)
            .bind(i64::from(query.from_minutes))
            .bind(query.day_type.id())
            .bind(query.season.id())
            .fetch_all(&self.pool)
            .await?;
        debug!(
            station = %query.station,
            from_minutes = query.from_minutes,
            day_type = query.day_type.id(),
            season = query.season.id(),
            count = rows.len(),
            "queried departures"
        );
        Ok(rows)
    }
}

/// Start opening the database in the background.
///
/// The returned gate opens once the database is available, or fails
/// with the open error.
pub fn spawn_bootstrap(config: StoreConfig) -> ReadinessGate<SqliteStore> {
    let gate = ReadinessGate::new();
    let task_gate = gate.clone();
    tokio::spawn(async move {
        // The outcome is recorded in the gate; nothing else to report here.
        let _ = resolve_with(&task_gate, SqliteStore::open(&config)).await;
    });
    gate
}
