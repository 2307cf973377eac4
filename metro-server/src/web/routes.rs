//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::domain::{Position, StationId};
use crate::geo::ReportedFix;
use crate::reference::KeyValueStore;
use crate::service::QueryError;
use crate::store::ScheduleStore;

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<S: ScheduleStore, K: KeyValueStore>(state: AppState<S, K>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready::<S, K>))
        .route("/stations", get(list_stations::<S, K>))
        .route("/departures", get(departures_near::<S, K>))
        .route("/stations/:id/departures", get(departures_at::<S, K>))
        .route(
            "/stations/by-name/:name/departures",
            get(departures_named::<S, K>),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness probe: 200 once the schedule database is open.
async fn ready<S: ScheduleStore, K: KeyValueStore>(
    State(state): State<AppState<S, K>>,
) -> (StatusCode, &'static str) {
    if state.service.is_ready() {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "not ready")
    }
}

/// Every station, for manual selection.
async fn list_stations<S: ScheduleStore, K: KeyValueStore>(
    State(state): State<AppState<S, K>>,
) -> Result<Json<StationsResponse>, AppError> {
    let stations = state.service.stations().await?;
    Ok(Json(StationsResponse::from_stations(&stations)))
}

/// Departures at the station nearest to the given coordinates.
async fn departures_near<S: ScheduleStore, K: KeyValueStore>(
    State(state): State<AppState<S, K>>,
    Query(req): Query<NearRequest>,
) -> Result<Json<NearResponse>, AppError> {
    let position = match (req.lng, req.lat) {
        (Some(lng), Some(lat)) => {
            Some(Position::new(lng, lat).map_err(|e| AppError::BadRequest {
                message: e.to_string(),
            })?)
        }
        (None, None) => None,
        _ => {
            return Err(AppError::BadRequest {
                message: "lng and lat must be given together".to_string(),
            });
        }
    };

    let resolution = state.service.upcoming_near(&ReportedFix(position)).await?;
    Ok(Json(NearResponse::from(&resolution)))
}

/// Departures at a station chosen by id.
async fn departures_at<S: ScheduleStore, K: KeyValueStore>(
    State(state): State<AppState<S, K>>,
    Path(id): Path<i64>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let result = state.service.upcoming_at(StationId(id)).await?;
    Ok(Json(DeparturesResponse::from(&result)))
}

/// Departures at a station chosen by name.
async fn departures_named<S: ScheduleStore, K: KeyValueStore>(
    State(state): State<AppState<S, K>>,
    Path(name): Path<String>,
) -> Result<Json<DeparturesResponse>, AppError> {
    let result = state.service.upcoming_named(&name).await?;
    Ok(Json(DeparturesResponse::from(&result)))
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Internal { message: String },
}

impl From<QueryError> for AppError {
    fn from(e: QueryError) -> Self {
        match e {
            QueryError::UnknownStation(_) | QueryError::UnknownStationName(_) => {
                AppError::NotFound {
                    message: e.to_string(),
                }
            }
            _ => AppError::Internal {
                message: e.to_string(),
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message),
        };

        if status.is_server_error() {
            error!(%status, %message, "request failed");
        } else {
            warn!(%status, %message, "request rejected");
        }

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
