use std::sync::Arc;

use smartclass_api::models::Action;
use time::OffsetDateTime;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::configs::{Storage, UnknownRoomPolicy};
use crate::errors::ControlError;
use crate::models::{ControlState, TelemetryRecord};
use crate::repositories::{ControlStateRepository, TelemetryRecordRepository};
use crate::services::RoomLocks;

const EVENT_CAPACITY: usize = 100;

/// One sensor sample as accepted by the gateway.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub temperature: f64,
    pub light_level: u32,
    pub motion: bool,
}

/// The only writer of control state.
///
/// Every mutation holds the room's lock for the whole read-modify-write and runs in
/// one transaction, so a telemetry record and the state derived from it are
/// committed together or not at all.
pub struct ControlService {
    storage: Arc<Storage>,
    control_state_repository: ControlStateRepository,
    telemetry_record_repository: TelemetryRecordRepository,
    room_locks: RoomLocks,
    unknown_room_policy: UnknownRoomPolicy,
    sender: broadcast::Sender<ControlState>,
}

impl ControlService {
    pub fn new(storage: Arc<Storage>, unknown_room_policy: UnknownRoomPolicy) -> Self {
        let (sender, _receiver) = broadcast::channel(EVENT_CAPACITY);

        Self {
            control_state_repository: ControlStateRepository::new(storage.clone()),
            telemetry_record_repository: TelemetryRecordRepository::new(storage.clone()),
            storage,
            room_locks: RoomLocks::new(),
            unknown_room_policy,
            sender,
        }
    }

    /// Creates the default (AUTO, OFF) state for `room_id` unless it exists.
    /// Returns whether the room is new.
    pub async fn register_room(&self, room_id: &str) -> Result<bool, ControlError> {
        validate_room_id(room_id)?;

        let _guard = self.room_locks.lock(room_id).await;
        let state = ControlState::new(room_id, OffsetDateTime::now_utc());

        let mut tx = self.storage.begin().await?;
        let created = self.control_state_repository.create_if_missing(&state, &mut tx).await?;
        tx.commit().await?;

        if created {
            info!(room_id, "room registered");
            self.publish(&state);
        }

        Ok(created)
    }

    pub async fn seed_rooms(&self, room_ids: &[String]) -> Result<usize, ControlError> {
        let mut created = 0;

        for room_id in room_ids {
            if self.register_room(room_id).await? {
                created += 1;
            }
        }

        info!("seeded {} of {} rooms", created, room_ids.len());

        Ok(created)
    }

    /// Appends the sample to the history, refreshes the cached readings and, in AUTO
    /// mode, switches the light to follow motion.
    pub async fn apply_telemetry(
        &self,
        room_id: &str,
        reading: Reading,
    ) -> Result<ControlState, ControlError> {
        validate_room_id(room_id)?;
        if !reading.temperature.is_finite() {
            return Err(ControlError::Validation(String::from(
                "temperature must be a finite number",
            )));
        }

        let _guard = self.room_locks.lock(room_id).await;
        let now = OffsetDateTime::now_utc();
        let mut tx = self.storage.begin().await?;

        if !self.control_state_repository.touch(room_id, now, &mut tx).await? {
            match self.unknown_room_policy {
                UnknownRoomPolicy::Reject => {
                    warn!(room_id, "telemetry for unknown room rejected");
                    return Err(ControlError::UnknownRoom(room_id.to_string()));
                }
                UnknownRoomPolicy::Provision => {
                    let state = ControlState::new(room_id, now);
                    self.control_state_repository.create_if_missing(&state, &mut tx).await?;
                    info!(room_id, "unknown room provisioned with default state");
                }
            }
        }

        let record = TelemetryRecord {
            id: 0,
            room_id: room_id.to_string(),
            temperature: reading.temperature,
            light_level: reading.light_level,
            motion: reading.motion,
            captured_at: now,
        };
        self.telemetry_record_repository.create(&record, &mut tx).await?;

        let mut state = self
            .control_state_repository
            .find_by_room_id_for_update(room_id, &mut tx)
            .await?
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;
        state.observe(reading.temperature, reading.light_level, reading.motion);
        state.updated_at = now;
        self.control_state_repository.update(&state, &mut tx).await?;

        tx.commit().await?;

        debug!(
            room_id,
            temperature = reading.temperature,
            light_level = reading.light_level,
            motion = reading.motion,
            light_status = %state.light_status,
            mode = %state.mode,
            "telemetry applied"
        );
        self.publish(&state);

        Ok(state)
    }

    /// `ON`/`OFF` pin the light and switch to MANUAL; `AUTO` only restores the mode.
    pub async fn apply_command(
        &self,
        room_id: &str,
        action: Action,
    ) -> Result<ControlState, ControlError> {
        validate_room_id(room_id)?;

        let _guard = self.room_locks.lock(room_id).await;
        let now = OffsetDateTime::now_utc();
        let mut tx = self.storage.begin().await?;

        if !self.control_state_repository.touch(room_id, now, &mut tx).await? {
            warn!(room_id, action = %action, "command for unknown room rejected");
            return Err(ControlError::UnknownRoom(room_id.to_string()));
        }

        let mut state = self
            .control_state_repository
            .find_by_room_id_for_update(room_id, &mut tx)
            .await?
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))?;
        state.command(action);
        state.updated_at = now;
        self.control_state_repository.update(&state, &mut tx).await?;

        tx.commit().await?;

        info!(
            room_id,
            action = %action,
            light_status = %state.light_status,
            mode = %state.mode,
            "command applied"
        );
        self.publish(&state);

        Ok(state)
    }

    pub async fn get_all_states(&self) -> Result<Vec<ControlState>, ControlError> {
        Ok(self.control_state_repository.find_all().await?)
    }

    pub async fn get_state(&self, room_id: &str) -> Result<ControlState, ControlError> {
        self.control_state_repository
            .find_by_room_id(room_id)
            .await?
            .ok_or_else(|| ControlError::UnknownRoom(room_id.to_string()))
    }

    /// Up to `limit` records of `room_id`, newest first.
    pub async fn get_recent_history(
        &self,
        room_id: &str,
        limit: u32,
    ) -> Result<Vec<TelemetryRecord>, ControlError> {
        self.get_state(room_id).await?;

        Ok(self
            .telemetry_record_repository
            .find_recent_by_room_id(room_id, limit)
            .await?)
    }

    /// Up to `limit` records across all rooms, newest first.
    pub async fn get_latest(&self, limit: u32) -> Result<Vec<TelemetryRecord>, ControlError> {
        Ok(self.telemetry_record_repository.find_recent(limit).await?)
    }

    /// Receives every committed state change.
    pub fn subscribe(&self) -> broadcast::Receiver<ControlState> {
        self.sender.subscribe()
    }

    fn publish(&self, state: &ControlState) {
        // no subscriber is not an error
        let _ = self.sender.send(state.clone());
    }
}

fn validate_room_id(room_id: &str) -> Result<(), ControlError> {
    if room_id.trim().is_empty() {
        return Err(ControlError::Validation(String::from("room id must not be empty")));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use smartclass_api::models::{LightStatus, Mode};
    use tokio::time::timeout;

    use crate::tests::*;

    use super::*;

    const ROOM: &str = "Class 101";

    async fn setup_service(policy: UnknownRoomPolicy) -> (Arc<Storage>, ControlService) {
        let storage = setup_test_db().await;
        let service = ControlService::new(storage.clone(), policy);
        service
            .seed_rooms(&[ROOM.to_string(), "Class 102".to_string(), "Class 103".to_string()])
            .await
            .unwrap();

        (storage, service)
    }

    fn reading(temperature: f64, light_level: u32, motion: bool) -> Reading {
        Reading {
            temperature,
            light_level,
            motion,
        }
    }

    #[tokio::test]
    async fn test_seeded_rooms_start_auto_off() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;

        let states = service.get_all_states().await.unwrap();
        assert_eq!(states.len(), 3);
        for state in states {
            assert_eq!(state.mode, Mode::Auto);
            assert_eq!(state.light_status, LightStatus::Off);
            assert_eq!(state.last_temperature, 0.0);
            assert_eq!(state.last_light_level, 0);
            assert!(!state.last_motion);
        }
    }

    #[tokio::test]
    async fn test_seeding_again_keeps_state() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        service.apply_command(ROOM, Action::On).await.unwrap();

        let created = service.seed_rooms(&[ROOM.to_string()]).await.unwrap();
        assert_eq!(created, 0);

        let state = service.get_state(ROOM).await.unwrap();
        assert_eq!((state.mode, state.light_status), (Mode::Manual, LightStatus::On));
    }

    #[tokio::test]
    async fn test_end_to_end_scenario() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Reject).await;

        let state = service.apply_telemetry(ROOM, reading(22.5, 10, true)).await.unwrap();
        assert_eq!(state.mode, Mode::Auto);
        assert_eq!(state.light_status, LightStatus::On);
        assert_eq!(state.last_temperature, 22.5);
        assert_eq!(state.last_light_level, 10);
        assert!(state.last_motion);
        assert_eq!(count_test_telemetry_records(storage.clone(), ROOM).await, 1);

        let state = service.apply_command(ROOM, Action::Off).await.unwrap();
        assert_eq!((state.mode, state.light_status), (Mode::Manual, LightStatus::Off));

        let state = service.apply_telemetry(ROOM, reading(23.0, 500, true)).await.unwrap();
        assert_eq!(state.light_status, LightStatus::Off);
        assert_eq!(state.mode, Mode::Manual);
        assert_eq!(
            (state.last_temperature, state.last_light_level, state.last_motion),
            (23.0, 500, true)
        );

        let state = service.apply_command(ROOM, Action::Auto).await.unwrap();
        assert_eq!(state.mode, Mode::Auto);
        assert_eq!(state.light_status, LightStatus::Off);

        let state = service.apply_telemetry(ROOM, reading(23.1, 480, true)).await.unwrap();
        assert_eq!(state.light_status, LightStatus::On);

        let persisted = service.get_state(ROOM).await.unwrap();
        assert_eq!((persisted.mode, persisted.light_status), (state.mode, state.light_status));
        assert_eq!(persisted.last_temperature, 23.1);
        assert_eq!(persisted.last_light_level, 480);
        assert_eq!(count_test_telemetry_records(storage.clone(), ROOM).await, 3);
    }

    #[tokio::test]
    async fn test_auto_light_follows_motion() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;

        for motion in [true, false, false, true, false] {
            let state = service.apply_telemetry(ROOM, reading(21.0, 300, motion)).await.unwrap();
            let expected = if motion { LightStatus::On } else { LightStatus::Off };
            assert_eq!(state.light_status, expected);
        }
    }

    #[tokio::test]
    async fn test_manual_mode_ignores_telemetry() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        service.apply_command(ROOM, Action::On).await.unwrap();

        for motion in [false, true, false] {
            let state = service.apply_telemetry(ROOM, reading(21.0, 300, motion)).await.unwrap();
            assert_eq!(state.light_status, LightStatus::On);
            assert_eq!(state.mode, Mode::Manual);
        }
    }

    #[tokio::test]
    async fn test_commands_are_idempotent() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        service.apply_telemetry(ROOM, reading(21.0, 300, true)).await.unwrap();

        for action in [Action::Off, Action::On, Action::Auto] {
            let once = service.apply_command(ROOM, action).await.unwrap();
            let twice = service.apply_command(ROOM, action).await.unwrap();

            assert_eq!(once.mode, twice.mode);
            assert_eq!(once.light_status, twice.light_status);
            assert_eq!(
                (once.last_temperature, once.last_light_level, once.last_motion),
                (twice.last_temperature, twice.last_light_level, twice.last_motion)
            );
        }
    }

    #[tokio::test]
    async fn test_unknown_room_rejected() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Reject).await;

        let error = service.apply_command("UnknownRoom999", Action::On).await.unwrap_err();
        assert!(matches!(error, ControlError::UnknownRoom(ref room) if room == "UnknownRoom999"));

        let error = service
            .apply_telemetry("UnknownRoom999", reading(20.0, 100, true))
            .await
            .unwrap_err();
        assert!(matches!(error, ControlError::UnknownRoom(_)));

        assert_eq!(count_test_telemetry_records(storage.clone(), "UnknownRoom999").await, 0);
        assert!(matches!(service.get_state("UnknownRoom999").await, Err(ControlError::UnknownRoom(_))));
        assert!(matches!(
            service.get_recent_history("UnknownRoom999", 10).await,
            Err(ControlError::UnknownRoom(_))
        ));
    }

    #[tokio::test]
    async fn test_unknown_room_provisioned() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Provision).await;

        let state = service.apply_telemetry("Lab 7", reading(19.5, 50, true)).await.unwrap();
        assert_eq!(state.mode, Mode::Auto);
        assert_eq!(state.light_status, LightStatus::On);
        assert_eq!(count_test_telemetry_records(storage.clone(), "Lab 7").await, 1);
        assert_eq!(service.get_all_states().await.unwrap().len(), 4);

        // commands never provision
        let error = service.apply_command("Lab 8", Action::On).await.unwrap_err();
        assert!(matches!(error, ControlError::UnknownRoom(_)));
    }

    #[tokio::test]
    async fn test_validation() {
        let (_, service) = setup_service(UnknownRoomPolicy::Provision).await;

        let error = service.apply_telemetry("  ", reading(20.0, 1, true)).await.unwrap_err();
        assert!(matches!(error, ControlError::Validation(_)));

        let error = service.apply_telemetry(ROOM, reading(f64::NAN, 1, true)).await.unwrap_err();
        assert!(matches!(error, ControlError::Validation(_)));

        let error = service.apply_command("", Action::On).await.unwrap_err();
        assert!(matches!(error, ControlError::Validation(_)));

        let error = service.register_room("").await.unwrap_err();
        assert!(matches!(error, ControlError::Validation(_)));
    }

    #[tokio::test]
    async fn test_recent_history_newest_first() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;

        for temperature in [20.0, 21.0, 22.0] {
            service.apply_telemetry(ROOM, reading(temperature, 100, false)).await.unwrap();
        }
        service.apply_telemetry("Class 102", reading(30.0, 100, false)).await.unwrap();

        let history = service.get_recent_history(ROOM, 2).await.unwrap();
        let temperatures: Vec<f64> = history.iter().map(|r| r.temperature).collect();
        assert_eq!(temperatures, vec![22.0, 21.0]);

        let latest = service.get_latest(10).await.unwrap();
        assert_eq!(latest.len(), 4);
        assert_eq!(latest[0].room_id, "Class 102");

        assert!(service.get_recent_history("Class 103", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_state_changes_are_published() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        let mut receiver = service.subscribe();

        service.apply_telemetry(ROOM, reading(22.5, 10, true)).await.unwrap();
        service.apply_command("Class 102", Action::On).await.unwrap();

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.room_id, ROOM);
        assert_eq!(first.light_status, LightStatus::On);

        let second = receiver.recv().await.unwrap();
        assert_eq!(second.room_id, "Class 102");
        assert_eq!(second.mode, Mode::Manual);
    }

    #[tokio::test]
    async fn test_rejected_telemetry_is_not_published() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        let mut receiver = service.subscribe();

        let _ = service.apply_telemetry("Nowhere", reading(20.0, 1, true)).await;

        assert!(matches!(
            receiver.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_storage_failure_surfaces() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Reject).await;
        storage.get_pool().close().await;

        let error = service.apply_telemetry(ROOM, reading(20.0, 1, true)).await.unwrap_err();
        assert!(matches!(error, ControlError::StorageFailure(_)));
        assert!(error.is_transient());

        let error = service.apply_command(ROOM, Action::On).await.unwrap_err();
        assert!(matches!(error, ControlError::StorageFailure(_)));
    }

    #[tokio::test]
    async fn test_failed_state_update_discards_record() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Reject).await;
        let before = service.get_state(ROOM).await.unwrap();

        sqlx::raw_sql(
            r#"
            CREATE TRIGGER reject_state_update
            BEFORE UPDATE OF last_temperature ON control_states
            BEGIN
                SELECT RAISE(ABORT, 'state update rejected');
            END;
            "#,
        )
        .execute(storage.get_pool())
        .await
        .unwrap();

        let error = service.apply_telemetry(ROOM, reading(25.0, 300, true)).await.unwrap_err();
        assert!(matches!(error, ControlError::StorageFailure(_)));

        assert_eq!(count_test_telemetry_records(storage.clone(), ROOM).await, 0);
        let after = service.get_state(ROOM).await.unwrap();
        assert_eq!(after.light_status, before.light_status);
        assert_eq!(after.mode, before.mode);
        assert_eq!(after.last_temperature, before.last_temperature);
        assert_eq!(after.last_light_level, before.last_light_level);
        assert_eq!(after.last_motion, before.last_motion);
    }

    #[tokio::test]
    async fn test_unknown_rooms_leave_no_lock_entries() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;

        for i in 0..200 {
            let room_id = format!("bogus-{i}");
            let error = service.apply_telemetry(&room_id, reading(20.0, 1, true)).await.unwrap_err();
            assert!(matches!(error, ControlError::UnknownRoom(_)));

            let error = service.apply_command(&room_id, Action::On).await.unwrap_err();
            assert!(matches!(error, ControlError::UnknownRoom(_)));
        }
        service.apply_telemetry(ROOM, reading(20.0, 1, true)).await.unwrap();

        assert!(service.room_locks.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_telemetry_same_room() {
        let (storage, service) = setup_service(UnknownRoomPolicy::Reject).await;
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..20u32)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    service
                        .apply_telemetry(ROOM, reading(20.0 + i as f64, i, i % 2 == 0))
                        .await
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(count_test_telemetry_records(storage.clone(), ROOM).await, 20);

        // the cached readings belong to the last committed sample
        let state = service.get_state(ROOM).await.unwrap();
        let newest = service.get_recent_history(ROOM, 1).await.unwrap().remove(0);
        assert_eq!(state.last_temperature, newest.temperature);
        assert_eq!(state.last_light_level, newest.light_level);
        assert_eq!(state.last_motion, newest.motion);
        let expected = if newest.motion { LightStatus::On } else { LightStatus::Off };
        assert_eq!(state.light_status, expected);
        assert_eq!(state.mode, Mode::Auto);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_commands_and_telemetry() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;
        let service = Arc::new(service);

        let tasks: Vec<_> = (0..20u32)
            .map(|i| {
                let service = service.clone();
                tokio::spawn(async move {
                    if i % 4 == 0 {
                        service.apply_command(ROOM, Action::On).await
                    } else {
                        service.apply_telemetry(ROOM, reading(21.0, i, false)).await
                    }
                })
            })
            .collect();

        for task in tasks {
            task.await.unwrap().unwrap();
        }

        // once pinned ON, no motion=false sample may switch it off
        let state = service.get_state(ROOM).await.unwrap();
        assert_eq!((state.mode, state.light_status), (Mode::Manual, LightStatus::On));
    }

    #[tokio::test]
    async fn test_rooms_do_not_block_each_other() {
        let (_, service) = setup_service(UnknownRoomPolicy::Reject).await;

        let guard = service.room_locks.lock(ROOM).await;

        let other = timeout(
            Duration::from_millis(500),
            service.apply_telemetry("Class 102", reading(20.0, 1, true)),
        )
        .await;
        assert!(matches!(other, Ok(Ok(_))));

        let same = timeout(
            Duration::from_millis(100),
            service.apply_command(ROOM, Action::On),
        )
        .await;
        assert!(same.is_err());

        drop(guard);
        let state = service.apply_command(ROOM, Action::On).await.unwrap();
        assert_eq!(state.light_status, LightStatus::On);
    }
}
