use std::sync::Arc;

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use smartclass_server::app::create_router;
use smartclass_server::configs::{History, Rooms, Storage, UnknownRoomPolicy};
use smartclass_server::services::ControlService;
use smartclass_server::tests::setup_test_db;

pub const SEEDED_ROOMS: [&str; 3] = ["Class 101", "Class 102", "Class 103"];

pub struct MockApp {
    pub storage: Arc<Storage>,
    pub control_service: Arc<ControlService>,
    pub router: Router,
}

impl MockApp {
    pub async fn new() -> Self {
        Self::with_rooms(Rooms {
            seed: SEEDED_ROOMS.iter().map(|room| room.to_string()).collect(),
            unknown_policy: UnknownRoomPolicy::Reject,
            default_room: None,
        })
        .await
    }

    pub async fn with_rooms(rooms: Rooms) -> Self {
        let storage = setup_test_db().await;

        let control_service = Arc::new(ControlService::new(storage.clone(), rooms.unknown_policy));
        control_service.seed_rooms(&rooms.seed).await.unwrap();

        let history = History {
            default_limit: 10,
            max_limit: 100,
        };
        let router = create_router(control_service.clone(), &rooms, &history);

        Self {
            storage,
            control_service,
            router,
        }
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap();

        self.send(request).await
    }

    pub async fn post_raw(&self, uri: &str, body: &'static str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::POST)
            .header("Content-Type", "application/json")
            .body(Body::from(body))
            .unwrap();

        self.send(request).await
    }

    pub async fn get_json(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .uri(uri)
            .method(Method::GET)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };

        (status, value)
    }
}
