use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::{Json, Router};
use smartclass_api::models::*;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::configs::{History, Rooms, SchemaManager, Settings, Storage};
use crate::handles::*;
use crate::services::ControlService;

#[derive(OpenApi)]
#[openapi(
    paths(
        ingest_telemetry,
        execute_command,
        get_status,
        get_room_state,
        get_room_history,
        get_latest,
    ),
    components(schemas(
        Action,
        ControlRequest,
        ControlResponse,
        ControlStateResponse,
        LightStatus,
        Mode,
        StatusResponse,
        TelemetryRecordResponse,
        TelemetryRequest,
    )),
    tags(
        (name = "telemetry", description = "Sensor ingestion"),
        (name = "control", description = "Operator commands"),
        (name = "status", description = "Current state and history")
    )
)]
pub struct ApiDoc;

pub async fn create_app(settings: &Arc<Settings>) -> anyhow::Result<Router> {
    let storage = Arc::new(
        Storage::new(settings.database.clone(), SchemaManager::default())
            .await
            .context("failed to open storage")?,
    );

    let control_service = Arc::new(ControlService::new(
        storage.clone(),
        settings.rooms.unknown_policy,
    ));
    control_service
        .seed_rooms(&settings.rooms.seed)
        .await
        .context("failed to seed rooms")?;

    Ok(create_router(control_service, &settings.rooms, &settings.history))
}

pub fn create_router(control_service: Arc<ControlService>, rooms: &Rooms, history: &History) -> Router {
    let telemetry = telemetry_router(TelemetryState {
        control_service: control_service.clone(),
        default_room: rooms.default_room.clone(),
    });

    let control = control_router(CommandState {
        control_service: control_service.clone(),
    });

    let status = status_router(StatusState {
        control_service: control_service.clone(),
        history: history.clone(),
    });

    let sse = sse_router(SSEState {
        control_service: control_service.clone(),
    });

    Router::new()
        .merge(telemetry)
        .merge(control)
        .merge(status)
        .merge(sse)
        .route("/api/openapi.json", get(openapi))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

async fn openapi() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
