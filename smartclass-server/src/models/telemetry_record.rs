use serde::{Deserialize, Serialize};
use smartclass_api::models::TelemetryRecordResponse;
use time::OffsetDateTime;

use super::Table;

/// One raw sensor sample. Rows are append-only.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct TelemetryRecord {
    pub id: i64,
    pub room_id: String,
    pub temperature: f64,
    pub light_level: u32,
    pub motion: bool,
    /// Server time at ingestion
    pub captured_at: OffsetDateTime,
}

impl From<TelemetryRecord> for TelemetryRecordResponse {
    fn from(record: TelemetryRecord) -> Self {
        Self {
            id: record.id,
            classroom_id: record.room_id,
            temperature: record.temperature,
            light_level: record.light_level,
            motion: record.motion,
            captured_at: record.captured_at,
        }
    }
}

#[derive(Clone)]
pub struct TelemetryRecordTable;

impl Table for TelemetryRecordTable {
    fn name(&self) -> &'static str {
        "telemetry_records"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS telemetry_records (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                room_id TEXT NOT NULL,
                temperature REAL NOT NULL,
                light_level INTEGER NOT NULL,
                motion BOOLEAN NOT NULL,
                captured_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_telemetry_records_room
                ON telemetry_records (room_id, id);
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS telemetry_records;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
