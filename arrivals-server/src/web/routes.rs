//! HTTP route handlers.

use askama::Template;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{get, post, put},
};
use chrono::Local;
use tracing::error;

use crate::busnearby::BusNearbyError;
use crate::coordinator::{Coordinator, RefreshError, RegistryError};
use crate::domain::{LineRef, TargetError, TrackedTarget};
use crate::sensor::readings;

use super::dto::*;
use super::state::AppState;
use super::templates::{BoardTemplate, TargetView};

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(board_page))
        .route("/health", get(health))
        .route("/api/targets", get(list_targets).post(create_target))
        .route("/api/targets/:key", get(get_target).delete(delete_target))
        .route("/api/targets/:key/refresh", post(refresh_target))
        .route("/api/targets/:key/lines", put(replace_lines))
        .route("/api/stops/search", get(search_stops))
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Arrival board page for every tracked target.
async fn board_page(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let now = Local::now();
    let mut targets = Vec::new();

    for coordinator in state.registry.list().await {
        targets.push(TargetView::build(&coordinator, now).await);
    }

    let html = BoardTemplate { targets }
        .render()
        .map_err(|e| AppError::Internal {
            message: format!("Template error: {e}"),
        })?;
    Ok(Html(html))
}

/// List tracked targets with their current readings.
async fn list_targets(State(state): State<AppState>) -> Json<Vec<TargetDetail>> {
    let mut details = Vec::new();

    for coordinator in state.registry.list().await {
        details.push(detail_for(&coordinator).await);
    }

    Json(details)
}

/// Start tracking a new target.
///
/// Stop ids are checked against the upstream before anything is
/// registered; names left out of the request are resolved from the
/// search endpoint.
async fn create_target(
    State(state): State<AppState>,
    Json(req): Json<CreateTargetRequest>,
) -> Result<(StatusCode, Json<TargetDetail>), AppError> {
    let mut target = match &req {
        CreateTargetRequest::Stop { stop_id, name, lines } => {
            TrackedTarget::stop(stop_id, name.as_deref(), lines)?
        }
        CreateTargetRequest::Route { from, to, from_name, to_name } => {
            TrackedTarget::route(from, to, from_name.as_deref(), to_name.as_deref())?
        }
    };

    // Check ids against the upstream, filling in names the caller
    // left out
    match &mut target {
        TrackedTarget::Stop { id, name, .. } => {
            let resolved = state.directory.validate(id).await.map_err(upstream_as_input)?;
            if matches!(&req, CreateTargetRequest::Stop { name: None, .. }) {
                *name = resolved;
            }
        }
        TrackedTarget::Route { from, to, from_name, to_name } => {
            let resolved_from = state.directory.validate(from).await.map_err(upstream_as_input)?;
            let resolved_to = state.directory.validate(to).await.map_err(upstream_as_input)?;

            if matches!(&req, CreateTargetRequest::Route { from_name: None, .. }) {
                *from_name = resolved_from;
            }
            if matches!(&req, CreateTargetRequest::Route { to_name: None, .. }) {
                *to_name = resolved_to;
            }
        }
    }

    let coordinator = state.registry.create(target).await?;
    let detail = detail_for(&coordinator).await;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// Detail for one tracked target.
async fn get_target(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TargetDetail>, AppError> {
    let coordinator = state.registry.get(&key).await?;
    Ok(Json(detail_for(&coordinator).await))
}

/// Stop tracking a target.
async fn delete_target(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<StatusCode, AppError> {
    state.registry.remove(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Force an immediate refresh of one target.
async fn refresh_target(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<TargetDetail>, AppError> {
    let coordinator = state.registry.get(&key).await?;

    match coordinator.refresh().await {
        Ok(_) | Err(RefreshError::Api(_)) => {
            // An upstream failure is recorded in the observation; the
            // caller still gets the current state back
            Ok(Json(detail_for(&coordinator).await))
        }
        Err(RefreshError::InFlight) => Err(AppError::Conflict {
            message: format!("a refresh of {key} is already in flight"),
        }),
    }
}

/// Replace a stop target's tracked lines.
async fn replace_lines(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(req): Json<ReplaceLinesRequest>,
) -> Result<Json<TargetDetail>, AppError> {
    if req.lines.is_empty() {
        return Err(AppError::BadRequest {
            message: "at least one line is required".to_string(),
        });
    }

    let lines: Vec<LineRef> = req
        .lines
        .iter()
        .map(|l| LineRef::parse(l))
        .collect::<Result<_, _>>()
        .map_err(|e| AppError::BadRequest {
            message: e.to_string(),
        })?;

    state.registry.replace_lines(&key, lines).await?;

    let coordinator = state.registry.get(&key).await?;
    Ok(Json(detail_for(&coordinator).await))
}

/// Free-text stop search.
async fn search_stops(
    State(state): State<AppState>,
    Query(req): Query<SearchQuery>,
) -> Result<Json<StopSearchResponse>, AppError> {
    if req.q.trim().is_empty() {
        return Err(AppError::BadRequest {
            message: "query must not be empty".to_string(),
        });
    }

    let limit = req.limit.unwrap_or(10).min(50);
    let matches = state.directory.search(&req.q).await?;

    let stops = matches
        .into_iter()
        .take(limit)
        .map(|m| StopResult {
            id: m.stop_id,
            name: m.name,
            city: m.city,
        })
        .collect();

    Ok(Json(StopSearchResponse { stops }))
}

/// Build the detail payload for a coordinator's current state.
async fn detail_for(coordinator: &Coordinator) -> TargetDetail {
    let target = coordinator.target().await;
    let obs = coordinator.observe().await;
    let projected = readings(&target, &obs, Local::now());
    TargetDetail::from_readings(&target, &obs, &projected)
}

/// During target creation an unknown stop is the caller's mistake, not
/// an upstream outage.
fn upstream_as_input(e: BusNearbyError) -> AppError {
    match e {
        BusNearbyError::NotFound(id) => AppError::BadRequest {
            message: format!("stop {id} is not known to the upstream"),
        },
        other => AppError::from(other),
    }
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    NotFound { message: String },
    Conflict { message: String },
    Upstream { message: String },
    Internal { message: String },
}

impl From<TargetError> for AppError {
    fn from(e: TargetError) -> Self {
        AppError::BadRequest {
            message: e.to_string(),
        }
    }
}

impl From<RegistryError> for AppError {
    fn from(e: RegistryError) -> Self {
        match e {
            RegistryError::Duplicate(_) => AppError::Conflict {
                message: e.to_string(),
            },
            RegistryError::Unknown(_) => AppError::NotFound {
                message: e.to_string(),
            },
            RegistryError::NotAStop(_) => AppError::BadRequest {
                message: e.to_string(),
            },
        }
    }
}

impl From<BusNearbyError> for AppError {
    fn from(e: BusNearbyError) -> Self {
        AppError::Upstream {
            message: e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message.clone()),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message.clone()),
            AppError::Upstream { message } => (StatusCode::BAD_GATEWAY, message.clone()),
            AppError::Internal { message } => (StatusCode::INTERNAL_SERVER_ERROR, message.clone()),
        };

        error!(status = %status, message = %message, "request failed");

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}
