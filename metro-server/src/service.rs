//! Query orchestration: from "where am I, what time is it" to grouped
//! upcoming departures.

use std::sync::Arc;

use tracing::{info, instrument, warn};

use crate::domain::{Clock, Station, StationId, TimeSnapshot};
use crate::geo::{FixOptions, GeolocationSource, LocateError, locate, nearest_station};
use crate::reference::{KeyValueStore, ReferenceCache};
use crate::repository::ScheduleRepository;
use crate::schedule::{
    DirectionGroup, GroupingError, HolidayIndex, ScheduleContext, classify, group_by_direction,
};
use crate::store::{ReadinessGate, ScheduleStore, StoreError};

/// Errors surfaced to the caller of a query.
///
/// Store faults once the store is open are not listed: they degrade the
/// result instead (see [`StationDepartures::degraded`]).
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// Reference data could not be loaded, or the store never opened
    #[error("reference data unavailable: {0}")]
    References(#[from] StoreError),

    #[error("unknown station {0}")]
    UnknownStation(StationId),

    #[error("no station named {0:?}")]
    UnknownStationName(String),

    /// Data-integrity fault while locating the nearest station
    #[error(transparent)]
    Locate(#[from] LocateError),

    /// Data-integrity fault while grouping departures
    #[error(transparent)]
    Grouping(#[from] GroupingError),
}

/// Upcoming departures at one station.
#[derive(Debug, Clone)]
pub struct StationDepartures {
    pub station: Station,
    /// Distance from the rider's fix, when the station was found by position.
    pub distance_km: Option<f64>,
    pub snapshot: TimeSnapshot,
    pub context: ScheduleContext,
    /// One group per direction, in first-seen order. Empty when nothing is left today.
    pub groups: Vec<DirectionGroup>,
    /// A schedule or reference lookup failed and `groups` is empty because of it.
    pub degraded: bool,
}

/// Outcome of a position-based query.
#[derive(Debug, Clone)]
pub enum Resolution {
    Departures(StationDepartures),
    /// No position fix; the rider has to pick a station by hand.
    ChooseStation {
        stations: Arc<[Station]>,
        reason: String,
    },
}

/// Answers departure queries against cached reference data and the
/// schedule store.
pub struct ScheduleService<S, K> {
    gate: ReadinessGate<S>,
    references: ReferenceCache<S, K>,
    repository: ScheduleRepository<S>,
    clock: Arc<dyn Clock>,
    fix_options: FixOptions,
}

impl<S: ScheduleStore, K: KeyValueStore> ScheduleService<S, K> {
    pub fn new(
        gate: ReadinessGate<S>,
        references: ReferenceCache<S, K>,
        repository: ScheduleRepository<S>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            gate,
            references,
            repository,
            clock,
            fix_options: FixOptions::default(),
        }
    }

    /// Options passed to the geolocation source on every query.
    pub fn with_fix_options(mut self, options: FixOptions) -> Self {
        self.fix_options = options;
        self
    }

    /// Whether the schedule store is open.
    pub fn is_ready(&self) -> bool {
        self.gate.is_ready()
    }

    /// All stations, for manual selection.
    pub async fn stations(&self) -> Result<Arc<[Station]>, QueryError> {
        Ok(self.references.stations().await?)
    }

    /// Departures at the station nearest to the rider.
    ///
    /// The position fix and the station list are fetched together. Without
    /// a fix the caller gets the station list back to choose from.
    #[instrument(skip_all)]
    pub async fn upcoming_near<G: GeolocationSource>(
        &self,
        source: &G,
    ) -> Result<Resolution, QueryError> {
        let (fix, stations) = futures::join!(
            locate(source, self.fix_options),
            self.references.stations()
        );
        let stations = stations?;

        let position = match fix {
            Ok(position) => position,
            Err(e) => {
                warn!(error = %e, "no position fix, offering station choice");
                return Ok(Resolution::ChooseStation {
                    stations,
                    reason: e.to_string(),
                });
            }
        };

        let nearest = nearest_station(position, &stations)?;
        info!(
            station = %nearest.station.name,
            distance_km = nearest.distance_km,
            "nearest station"
        );
        let distance_km = nearest.distance_km;
        let station = nearest.station.clone();

        let mut departures = self.departures_for(station).await?;
        departures.distance_km = Some(distance_km);
        Ok(Resolution::Departures(departures))
    }

    /// Departures at a station chosen by id.
    #[instrument(skip(self))]
    pub async fn upcoming_at(&self, id: StationId) -> Result<StationDepartures, QueryError> {
        let station = self
            .references
            .stations()
            .await?
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or(QueryError::UnknownStation(id))?;
        self.departures_for(station).await
    }

    /// Departures at a station chosen by its exact name.
    #[instrument(skip(self))]
    pub async fn upcoming_named(&self, name: &str) -> Result<StationDepartures, QueryError> {
        let station = self
            .references
            .stations()
            .await?
            .iter()
            .find(|s| s.name == name)
            .cloned()
            .ok_or_else(|| QueryError::UnknownStationName(name.to_string()))?;
        self.departures_for(station).await
    }

    async fn departures_for(&self, station: Station) -> Result<StationDepartures, QueryError> {
        let references =
            futures::try_join!(self.references.holidays(), self.references.directions());
        let snapshot = TimeSnapshot::from_datetime(self.clock.now());

        let (holidays, directions) = match references {
            Ok(references) => references,
            // A store that never opened is fatal, not a degraded answer
            Err(e @ StoreError::NotReady(_)) => return Err(e.into()),
            Err(e) => {
                warn!(station = %station.id, error = %e, "reference lookup failed, showing none");
                return Ok(StationDepartures {
                    station,
                    distance_km: None,
                    snapshot,
                    context: classify(&snapshot, &HolidayIndex::default()),
                    groups: Vec::new(),
                    degraded: true,
                });
            }
        };
        let context = classify(&snapshot, &holidays);

        let (rows, degraded) = match self.repository.fetch_departures(station.id, &context).await {
            Ok(rows) => (rows, false),
            Err(e) => {
                warn!(station = %station.id, error = %e, "departure lookup failed, showing none");
                (Arc::default(), true)
            }
        };

        let groups = group_by_direction(rows.iter().cloned(), &directions)?;
        info!(
            station = %station.id,
            at = %snapshot,
            day_type = context.day_type.id(),
            season = context.season.id(),
            groups = groups.len(),
            departures = rows.len(),
            "departures resolved"
        );

        Ok(StationDepartures {
            station,
            distance_km: None,
            snapshot,
            context,
            groups,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Departure, Direction, DirectionId, FixedClock, Holiday, Position};
    use crate::geo::{FixError, ReportedFix};
    use crate::reference::MemoryKvStore;
    use crate::repository::RepositoryConfig;
    use crate::schedule::{DayType, SeasonType};
    use crate::store::MemoryStore;
    use chrono::{NaiveDate, NaiveDateTime};
    use std::future::Future;
    use std::time::Duration;

    type TestService = ScheduleService<MemoryStore, MemoryKvStore>;

    fn station(id: i64, name: &str, longitude: f64, latitude: f64) -> Station {
        Station {
            id: StationId(id),
            name: name.to_string(),
            longitude,
            latitude,
        }
    }

    fn direction(id: i64, source: &str, destination: &str) -> Direction {
        Direction {
            id: DirectionId(id),
            line_id: 1,
            source: source.to_string(),
            destination: destination.to_string(),
            time_of_travel: 23,
        }
    }

    fn departure(id: i64, station: i64, direction: i64, minutes: i64, day_type: i64) -> Departure {
        Departure {
            id,
            hour_label: format!("{:02}:{:02}", (minutes / 60) % 24, minutes % 60),
            minutes,
            sequence: id,
            direction_id: DirectionId(direction),
            station_id: StationId(station),
            line_id: 1,
            season_type_id: 1,
            day_type_id: day_type,
        }
    }

    fn store() -> MemoryStore {
        MemoryStore::new(
            vec![
                station(1, "Cacilhas", -9.1486, 38.6877),
                station(2, "Almada", -9.1573, 38.6790),
                station(3, "Corroios", -9.1230, 38.6310),
            ],
            vec![
                direction(1, "Cacilhas", "Corroios"),
                direction(2, "Corroios", "Cacilhas"),
            ],
            vec![Holiday {
                id: 1,
                day_month_year: "25,4,2024".to_string(),
                name: "Dia da Liberdade".to_string(),
            }],
            vec![
                departure(1, 1, 1, 600, 1),
                departure(2, 1, 1, 620, 1),
                departure(3, 1, 2, 605, 1),
                departure(4, 1, 2, 1510, 1),
                departure(5, 1, 1, 590, 1),
                departure(6, 2, 1, 610, 1),
                departure(7, 1, 1, 700, 3),
                departure(8, 3, 9, 700, 1),
            ],
        )
    }

    fn at(y: i32, m: u32, d: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    /// Friday 2024-03-15, 10:00: weekday, winter, minute 600.
    fn friday_morning() -> NaiveDateTime {
        at(2024, 3, 15, 10, 0)
    }

    fn service_with(store: MemoryStore, now: NaiveDateTime) -> (TestService, ReadinessGate<MemoryStore>) {
        let gate = ReadinessGate::ready(store);
        let service = ScheduleService::new(
            gate.clone(),
            ReferenceCache::new(gate.clone(), MemoryKvStore::new(), "1"),
            ScheduleRepository::new(gate.clone(), &RepositoryConfig::default()),
            Arc::new(FixedClock(now)),
        );
        (service, gate)
    }

    fn ids(group: &DirectionGroup) -> Vec<i64> {
        group.departures.iter().map(|d| d.id).collect()
    }

    fn fix(longitude: f64, latitude: f64) -> ReportedFix {
        ReportedFix(Some(Position::new(longitude, latitude).unwrap()))
    }

    #[tokio::test]
    async fn nearest_station_departures_grouped() {
        let (service, _gate) = service_with(store(), friday_morning());

        let resolution = service.upcoming_near(&fix(-9.1490, 38.6870)).await.unwrap();

        let result = match resolution {
            Resolution::Departures(result) => result,
            other => panic!("expected departures, got {other:?}"),
        };
        assert_eq!(result.station.name, "Cacilhas");
        assert!(result.distance_km.unwrap() < 0.2);
        assert!(!result.degraded);
        assert_eq!(result.context.day_type, DayType::Weekday);
        assert_eq!(result.context.season, SeasonType::Winter);
        assert_eq!(result.context.service_minutes, 600);

        assert_eq!(result.groups.len(), 2);
        assert_eq!(result.groups[0].direction.destination, "Corroios");
        assert_eq!(ids(&result.groups[0]), vec![1, 2]);
        assert_eq!(result.groups[1].direction_id, DirectionId(2));
        assert_eq!(ids(&result.groups[1]), vec![3, 4]);
    }

    #[tokio::test]
    async fn no_fix_offers_station_choice() {
        let (service, _gate) = service_with(store(), friday_morning());

        let resolution = service.upcoming_near(&ReportedFix(None)).await.unwrap();

        let (stations, reason) = match resolution {
            Resolution::ChooseStation { stations, reason } => (stations, reason),
            other => panic!("expected station choice, got {other:?}"),
        };
        assert_eq!(stations.len(), 3);
        assert!(reason.contains("no coordinates reported"));
    }

    /// A source that answers after a delay.
    struct SlowSource(Duration);

    impl GeolocationSource for SlowSource {
        fn get_fix(
            &self,
            _options: FixOptions,
        ) -> impl Future<Output = Result<Position, FixError>> + Send {
            let delay = self.0;
            async move {
                tokio::time::sleep(delay).await;
                Ok(Position::new(-9.1486, 38.6877).unwrap())
            }
        }
    }

    #[tokio::test]
    async fn fix_timeout_offers_station_choice() {
        let (service, _gate) = service_with(store(), friday_morning());
        let service = service.with_fix_options(FixOptions {
            high_accuracy: true,
            timeout: Duration::from_millis(20),
        });

        let resolution = service
            .upcoming_near(&SlowSource(Duration::from_secs(5)))
            .await
            .unwrap();

        assert!(matches!(resolution, Resolution::ChooseStation { .. }));
    }

    #[tokio::test]
    async fn chosen_by_id_and_name() {
        let (service, _gate) = service_with(store(), friday_morning());

        let by_id = service.upcoming_at(StationId(2)).await.unwrap();
        assert_eq!(by_id.station.name, "Almada");
        assert_eq!(by_id.distance_km, None);
        assert_eq!(by_id.groups.len(), 1);
        assert_eq!(ids(&by_id.groups[0]), vec![6]);

        let by_name = service.upcoming_named("Cacilhas").await.unwrap();
        assert_eq!(by_name.station.id, StationId(1));
        assert_eq!(by_name.groups.len(), 2);
    }

    #[tokio::test]
    async fn unknown_station() {
        let (service, _gate) = service_with(store(), friday_morning());

        let err = service.upcoming_at(StationId(42)).await.unwrap_err();
        assert!(matches!(err, QueryError::UnknownStation(StationId(42))));

        let err = service.upcoming_named("cacilhas").await.unwrap_err();
        assert!(matches!(err, QueryError::UnknownStationName(_)));
    }

    #[tokio::test]
    async fn holiday_uses_sunday_timetable() {
        // Thursday, but a public holiday
        let (service, _gate) = service_with(store(), at(2024, 4, 25, 10, 0));

        let result = service.upcoming_at(StationId(1)).await.unwrap();

        assert!(result.context.is_holiday);
        assert_eq!(result.context.day_type, DayType::SundayOrHoliday);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(ids(&result.groups[0]), vec![7]);
    }

    #[tokio::test]
    async fn nothing_left_today_is_empty_not_error() {
        let (service, _gate) = service_with(store(), at(2024, 3, 15, 23, 59));

        let result = service.upcoming_at(StationId(1)).await.unwrap();

        assert!(!result.degraded);
        assert_eq!(result.groups.len(), 1);
        assert_eq!(ids(&result.groups[0]), vec![4]);
        assert_eq!(result.groups[0].departures[0].minutes_until(1439), 71);
    }

    #[tokio::test]
    async fn failed_departure_lookup_degrades() {
        let (service, gate) = service_with(store(), friday_morning());
        gate.wait().await.unwrap().set_departures_down(true);

        let result = service.upcoming_at(StationId(1)).await.unwrap();

        assert!(result.degraded);
        assert!(result.groups.is_empty());
    }

    #[tokio::test]
    async fn failed_reference_lookup_degrades() {
        let (service, gate) = service_with(store(), friday_morning());
        let store = gate.wait().await.unwrap();
        store.set_holidays_down(true);

        let result = service.upcoming_at(StationId(1)).await.unwrap();

        assert!(result.degraded);
        assert!(result.groups.is_empty());
        assert_eq!(result.station.name, "Cacilhas");
        assert_eq!(result.context.day_type, DayType::Weekday);
        assert_eq!(result.context.service_minutes, 600);

        let near = service.upcoming_near(&fix(-9.1490, 38.6870)).await.unwrap();
        match near {
            Resolution::Departures(result) => {
                assert!(result.degraded);
                assert!(result.distance_km.is_some());
            }
            other => panic!("expected departures, got {other:?}"),
        }

        // Nothing was cached from the failed attempts
        store.set_holidays_down(false);
        let result = service.upcoming_at(StationId(1)).await.unwrap();
        assert!(!result.degraded);
        assert_eq!(result.groups.len(), 2);
    }

    #[tokio::test]
    async fn station_list_failure_fails_position_query() {
        let gate: ReadinessGate<MemoryStore> = ReadinessGate::new();
        gate.fail("no database").unwrap();
        let service = ScheduleService::new(
            gate.clone(),
            ReferenceCache::new(gate.clone(), MemoryKvStore::new(), "1"),
            ScheduleRepository::new(gate.clone(), &RepositoryConfig::default()),
            Arc::new(FixedClock(friday_morning())),
        );

        let err = service.upcoming_near(&fix(-9.1486, 38.6877)).await.unwrap_err();

        assert!(matches!(err, QueryError::References(StoreError::NotReady(_))));
    }

    #[tokio::test]
    async fn unknown_direction_is_a_fault() {
        let (service, _gate) = service_with(store(), friday_morning());

        let err = service.upcoming_at(StationId(3)).await.unwrap_err();

        assert!(matches!(
            err,
            QueryError::Grouping(GroupingError::UnknownDirection { .. })
        ));
    }

    #[tokio::test]
    async fn references_loaded_once_across_queries() {
        let (service, gate) = service_with(store(), friday_morning());

        service.upcoming_near(&fix(-9.1573, 38.6790)).await.unwrap();
        service.upcoming_at(StationId(1)).await.unwrap();
        service.upcoming_named("Almada").await.unwrap();

        let calls = gate.wait().await.unwrap().calls();
        assert_eq!(calls.stations, 1);
        assert_eq!(calls.directions, 1);
        assert_eq!(calls.holidays, 1);
        assert_eq!(calls.departures, 2);
    }

    #[tokio::test]
    async fn failed_store_surfaces_as_reference_error() {
        let gate: ReadinessGate<MemoryStore> = ReadinessGate::new();
        gate.fail("no database").unwrap();
        let service = ScheduleService::new(
            gate.clone(),
            ReferenceCache::new(gate.clone(), MemoryKvStore::new(), "1"),
            ScheduleRepository::new(gate.clone(), &RepositoryConfig::default()),
            Arc::new(FixedClock(friday_morning())),
        );

        let err = service.stations().await.unwrap_err();

        assert!(matches!(err, QueryError::References(_)));
        assert!(!service.is_ready());
    }
}
