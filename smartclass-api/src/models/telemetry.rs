use std::fmt;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

use super::RoomId;

/// One sample as posted by a classroom sensor node.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryRequest {
    /// Source classroom; may be omitted only when the server has a default room
    #[serde(default, alias = "room_id")]
    pub classroom_id: Option<RoomId>,
    /// Temperature in Celsius
    pub temperature: f64,
    /// Light level in lux
    #[serde(alias = "light_level")]
    pub light: u32,
    /// Motion detected, as a boolean or `0`/`1`
    #[serde(alias = "motion_detected", deserialize_with = "motion_flag")]
    pub motion: bool,
}

fn motion_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    struct MotionVisitor;

    impl Visitor<'_> for MotionVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a boolean or the integer 0 or 1")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Unsigned(value), &self)),
            }
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<bool, E> {
            match value {
                0 => Ok(false),
                1 => Ok(true),
                _ => Err(E::invalid_value(Unexpected::Signed(value), &self)),
            }
        }
    }

    deserializer.deserialize_any(MotionVisitor)
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecordResponse {
    pub id: i64,
    pub classroom_id: RoomId,
    pub temperature: f64,
    pub light_level: u32,
    pub motion: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub captured_at: OffsetDateTime,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryQuery {
    /// Maximum number of records, newest first
    pub limit: Option<u32>,
}
