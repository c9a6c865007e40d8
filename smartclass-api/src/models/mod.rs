mod control;
mod status;
mod telemetry;

pub use control::*;
pub use status::*;
pub use telemetry::*;

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stable identifier of one classroom, e.g. `Class 101`.
pub type RoomId = String;

/// Returned when a wire string does not name a known enum variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "invalid {}: {:?}", self.kind, self.value)
    }
}

impl std::error::Error for ParseEnumError {}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Always `success` for accepted requests
    pub status: String,
}

impl StatusResponse {
    pub fn success() -> Self {
        Self {
            status: String::from("success"),
        }
    }
}
