use std::sync::Arc;

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::routing::post;
use axum::{Json, Router};
use smartclass_api::models::{Action, ControlRequest, ControlResponse};

use crate::errors::{ApiError, ControlError};
use crate::services::ControlService;

#[derive(Clone)]
pub struct CommandState {
    pub control_service: Arc<ControlService>,
}

pub fn control_router(command_state: CommandState) -> Router {
    Router::new()
        .route("/api/control", post(execute_command))
        .with_state(command_state)
}

#[utoipa::path(
    post,
    path = "/api/control",
    tag = "control",
    request_body = ControlRequest,
    responses(
        (status = 200, description = "Command applied", body = ControlResponse),
        (status = 400, description = "Malformed request or unknown action"),
        (status = 404, description = "Room is not registered"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn execute_command(
    State(state): State<CommandState>,
    payload: Result<Json<ControlRequest>, JsonRejection>,
) -> Result<Json<ControlResponse>, ApiError> {
    let Json(body) = payload.map_err(|e| ControlError::Validation(e.body_text()))?;

    let action: Action = body.action.parse().map_err(ControlError::from)?;

    state
        .control_service
        .apply_command(&body.classroom_id, action)
        .await?;

    Ok(Json(ControlResponse::success(action)))
}
