use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use smartclass_api::models::{ControlStateResponse, HistoryQuery, TelemetryRecordResponse};

use crate::configs::History;
use crate::errors::{ApiError, ControlError};
use crate::services::ControlService;

#[derive(Clone)]
pub struct StatusState {
    pub control_service: Arc<ControlService>,
    pub history: History,
}

pub fn status_router(status_state: StatusState) -> Router {
    Router::new()
        .route("/api/status", get(get_status))
        .route("/api/latest", get(get_latest))
        .route("/api/rooms/:room_id", get(get_room_state))
        .route("/api/rooms/:room_id/history", get(get_room_history))
        .with_state(status_state)
}

#[utoipa::path(
    get,
    path = "/api/status",
    tag = "status",
    responses(
        (status = 200, description = "Control state of every room", body = Vec<ControlStateResponse>),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_status(
    State(state): State<StatusState>,
) -> Result<Json<Vec<ControlStateResponse>>, ApiError> {
    let states = state.control_service.get_all_states().await?;

    Ok(Json(states.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}",
    tag = "status",
    params(
        ("room_id" = String, Path, description = "Room identifier")
    ),
    responses(
        (status = 200, description = "Control state of the room", body = ControlStateResponse),
        (status = 404, description = "Room is not registered"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_room_state(
    State(state): State<StatusState>,
    Path(room_id): Path<String>,
) -> Result<Json<ControlStateResponse>, ApiError> {
    let room = state.control_service.get_state(&room_id).await?;

    Ok(Json(room.into()))
}

#[utoipa::path(
    get,
    path = "/api/rooms/{room_id}/history",
    tag = "status",
    params(
        ("room_id" = String, Path, description = "Room identifier"),
        ("limit" = Option<u32>, Query, description = "Maximum number of records")
    ),
    responses(
        (status = 200, description = "Recent samples, newest first", body = Vec<TelemetryRecordResponse>),
        (status = 400, description = "Invalid limit"),
        (status = 404, description = "Room is not registered"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_room_history(
    State(state): State<StatusState>,
    Path(room_id): Path<String>,
    query: Result<Query<HistoryQuery>, QueryRejection>,
) -> Result<Json<Vec<TelemetryRecordResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| ControlError::Validation(e.body_text()))?;
    let limit = resolve_limit(&state.history, query.limit)?;

    let records = state
        .control_service
        .get_recent_history(&room_id, limit)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

#[utoipa::path(
    get,
    path = "/api/latest",
    tag = "status",
    responses(
        (status = 200, description = "Most recent samples of all rooms, newest first", body = Vec<TelemetryRecordResponse>),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn get_latest(
    State(state): State<StatusState>,
) -> Result<Json<Vec<TelemetryRecordResponse>>, ApiError> {
    let records = state
        .control_service
        .get_latest(state.history.default_limit)
        .await?;

    Ok(Json(records.into_iter().map(Into::into).collect()))
}

fn resolve_limit(history: &History, limit: Option<u32>) -> Result<u32, ControlError> {
    match limit {
        None => Ok(history.default_limit),
        Some(limit) if limit > history.max_limit => Err(ControlError::Validation(format!(
            "limit must not exceed {}",
            history.max_limit
        ))),
        Some(limit) => Ok(limit),
    }
}
