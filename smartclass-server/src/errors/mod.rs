pub mod api;
pub mod control;

pub use api::ApiError;
pub use control::ControlError;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use uuid::Uuid;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message, error_id) = match self {
            ApiError::ControlError(ControlError::StorageFailure(e)) => {
                let error_id = Uuid::new_v4();
                tracing::error!(error_id = ?error_id, "Storage failure: {}", e);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Storage unavailable".to_string(),
                    Some(error_id.to_string()),
                )
            }
            ApiError::ControlError(e) => (e.status_code(), e.to_string(), None),
        };

        // Create a consistent JSON error response
        let mut error_obj = json!({
            "code": status.as_u16(),
            "message": error_message
        });

        // storage failures carry an id to match the log line
        if let Some(error_id) = error_id {
            error_obj["error_id"] = json!(error_id);
        }

        let body = Json(json!({
            "error": error_obj
        }));

        // Combine status code and JSON body into a response
        (status, body).into_response()
    }
}
