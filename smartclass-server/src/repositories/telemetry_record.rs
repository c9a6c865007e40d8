use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};

use crate::configs::Storage;
use crate::models::TelemetryRecord;

#[derive(Clone)]
pub struct TelemetryRecordRepository {
    storage: Arc<Storage>,
}

impl TelemetryRecordRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl TelemetryRecordRepository {
    pub async fn create(
        &self,
        item: &TelemetryRecord,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<i64, Error> {
        let id = sqlx::query(
            r#"
            INSERT INTO telemetry_records (room_id, temperature, light_level, motion, captured_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(&item.room_id)
        .bind(item.temperature)
        .bind(item.light_level)
        .bind(item.motion)
        .bind(item.captured_at)
        .execute(&mut **transaction)
        .await?
        .last_insert_rowid();

        Ok(id)
    }

    /// Newest first, insertion order breaking timestamp ties.
    pub async fn find_recent_by_room_id(
        &self,
        room_id: &str,
        limit: u32,
    ) -> Result<Vec<TelemetryRecord>, Error> {
        let records: Vec<TelemetryRecord> = sqlx::query_as(
            r#"
            SELECT * FROM telemetry_records
            WHERE room_id = $1
            ORDER BY id DESC
            LIMIT $2
            "#,
        )
        .bind(room_id)
        .bind(limit)
        .fetch_all(self.storage.get_pool())
        .await?;

        Ok(records)
    }

    pub async fn find_recent(&self, limit: u32) -> Result<Vec<TelemetryRecord>, Error> {
        let records: Vec<TelemetryRecord> =
            sqlx::query_as("SELECT * FROM telemetry_records ORDER BY id DESC LIMIT $1")
                .bind(limit)
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(records)
    }
}
