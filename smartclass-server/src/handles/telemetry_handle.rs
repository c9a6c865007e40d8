use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use smartclass_api::models::{StatusResponse, TelemetryRequest};

use crate::errors::{ApiError, ControlError};
use crate::services::{ControlService, Reading};

#[derive(Clone)]
pub struct TelemetryState {
    pub control_service: Arc<ControlService>,
    /// Room assumed when a sample carries no room id
    pub default_room: Option<String>,
}

pub fn telemetry_router(telemetry_state: TelemetryState) -> Router {
    Router::new()
        .route("/api/data", post(ingest_telemetry))
        .with_state(telemetry_state)
}

#[utoipa::path(
    post,
    path = "/api/data",
    tag = "telemetry",
    request_body = TelemetryRequest,
    responses(
        (status = 200, description = "Sample stored and control state updated", body = StatusResponse),
        (status = 400, description = "Malformed or incomplete sample"),
        (status = 404, description = "Room is not registered"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn ingest_telemetry(
    State(state): State<TelemetryState>,
    payload: Result<Json<TelemetryRequest>, JsonRejection>,
) -> Result<Json<StatusResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ControlError::Validation(e.body_text()))?;

    let room_id = body
        .classroom_id
        .or_else(|| state.default_room.clone())
        .ok_or_else(|| ControlError::Validation(String::from("classroom_id is required")))?;

    let reading = Reading {
        temperature: body.temperature,
        light_level: body.light,
        motion: body.motion,
    };

    state.control_service.apply_telemetry(&room_id, reading).await?;

    Ok(Json(StatusResponse::success()))
}
