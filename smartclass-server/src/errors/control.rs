use axum::http::StatusCode;
use smartclass_api::models::ParseEnumError;

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Unknown room: {0}")]
    UnknownRoom(String),

    #[error("Invalid action: {0}")]
    InvalidAction(String),

    #[error("Storage failure: {0}")]
    StorageFailure(#[from] sqlx::Error),
}

impl ControlError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlError::Validation(_) => StatusCode::BAD_REQUEST,
            ControlError::UnknownRoom(_) => StatusCode::NOT_FOUND,
            ControlError::InvalidAction(_) => StatusCode::BAD_REQUEST,
            ControlError::StorageFailure(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Only storage failures may succeed when retried.
    pub fn is_transient(&self) -> bool {
        matches!(self, ControlError::StorageFailure(_))
    }
}

impl From<ParseEnumError> for ControlError {
    fn from(error: ParseEnumError) -> Self {
        ControlError::InvalidAction(error.value)
    }
}
