use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use super::{LightStatus, Mode, RoomId};

/// Current decided output of one classroom.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlStateResponse {
    pub classroom_id: RoomId,
    pub light_status: LightStatus,
    pub mode: Mode,
    /// Temperature of the latest sample in Celsius
    pub last_temperature: f64,
    /// Light level of the latest sample in lux
    pub last_light_level: u32,
    pub last_motion: bool,
    /// Time of the last mutation
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}
