use std::sync::Arc;

use sqlx::{Error, Sqlite, Transaction};
use time::OffsetDateTime;

use crate::configs::Storage;
use crate::models::ControlState;

#[derive(Clone)]
pub struct ControlStateRepository {
    storage: Arc<Storage>,
}

impl ControlStateRepository {
    pub fn new(storage: Arc<Storage>) -> Self {
        Self { storage }
    }
}

impl ControlStateRepository {
    /// Inserts the default state unless the room already exists.
    /// Returns whether a row was created.
    pub async fn create_if_missing(
        &self,
        item: &ControlState,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO control_states
                (room_id, light_status, mode, last_temperature, last_light_level, last_motion, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&item.room_id)
        .bind(item.light_status.as_str())
        .bind(item.mode.as_str())
        .bind(item.last_temperature)
        .bind(item.last_light_level)
        .bind(item.last_motion)
        .bind(item.updated_at)
        .execute(&mut **transaction)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Bumps `updated_at` so the transaction holds the write lock before reading.
    /// Returns `false` when the room is not registered.
    pub async fn touch(
        &self,
        room_id: &str,
        now: OffsetDateTime,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<bool, Error> {
        let result = sqlx::query("UPDATE control_states SET updated_at = $1 WHERE room_id = $2")
            .bind(now)
            .bind(room_id)
            .execute(&mut **transaction)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_room_id(&self, room_id: &str) -> Result<Option<ControlState>, Error> {
        let state: Option<ControlState> =
            sqlx::query_as("SELECT * FROM control_states WHERE room_id = $1")
                .bind(room_id)
                .fetch_optional(self.storage.get_pool())
                .await?;

        Ok(state)
    }

    pub async fn find_by_room_id_for_update(
        &self,
        room_id: &str,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<Option<ControlState>, Error> {
        let state: Option<ControlState> =
            sqlx::query_as("SELECT * FROM control_states WHERE room_id = $1")
                .bind(room_id)
                .fetch_optional(&mut **transaction)
                .await?;

        Ok(state)
    }

    pub async fn find_all(&self) -> Result<Vec<ControlState>, Error> {
        let states: Vec<ControlState> =
            sqlx::query_as("SELECT * FROM control_states ORDER BY room_id")
                .fetch_all(self.storage.get_pool())
                .await?;

        Ok(states)
    }

    pub async fn update(
        &self,
        item: &ControlState,
        transaction: &mut Transaction<'_, Sqlite>,
    ) -> Result<(), Error> {
        sqlx::query(
            r#"
            UPDATE control_states
            SET light_status = $1, mode = $2, last_temperature = $3,
                last_light_level = $4, last_motion = $5, updated_at = $6
            WHERE room_id = $7
            "#,
        )
        .bind(item.light_status.as_str())
        .bind(item.mode.as_str())
        .bind(item.last_temperature)
        .bind(item.last_light_level)
        .bind(item.last_motion)
        .bind(item.updated_at)
        .bind(&item.room_id)
        .execute(&mut **transaction)
        .await?;

        Ok(())
    }
}
