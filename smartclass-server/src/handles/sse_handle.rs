use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::State;
use axum::response::Sse;
use axum::response::sse::{Event, KeepAlive};
use axum::routing::get;
use axum::Router;
use smartclass_api::models::ControlStateResponse;
use tokio_stream::{Stream, StreamExt, wrappers};

use crate::services::ControlService;

#[derive(Clone)]
pub struct SSEState {
    pub control_service: Arc<ControlService>,
}

pub fn sse_router(sse_state: SSEState) -> Router {
    Router::new()
        .route("/api/events", get(sse_handler))
        .with_state(sse_state)
}

/// Pushes a `state` event for every committed state change.
pub async fn sse_handler(
    State(state): State<SSEState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let receiver = state.control_service.subscribe();

    let stream = wrappers::BroadcastStream::new(receiver)
        .filter_map(|result| {
            match result {
                Ok(room) => Event::default()
                    .event("state")
                    .json_data(ControlStateResponse::from(room))
                    .ok()
                    .map(Ok),
                // lagged receivers skip ahead, the next event carries full state
                Err(_) => None,
            }
        });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
