use serde::{Deserialize, Serialize};
use smartclass_api::models::{Action, ControlStateResponse, LightStatus, Mode};
use time::OffsetDateTime;

use super::Table;

/// Live control record of one room, one row per room id.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ControlState {
    pub room_id: String,
    #[sqlx(try_from = "String")]
    pub light_status: LightStatus,
    #[sqlx(try_from = "String")]
    pub mode: Mode,
    pub last_temperature: f64,
    pub last_light_level: u32,
    pub last_motion: bool,
    pub updated_at: OffsetDateTime,
}

impl ControlState {
    /// State of a freshly registered room: (AUTO, OFF) with zeroed readings.
    pub fn new(room_id: impl Into<String>, now: OffsetDateTime) -> Self {
        Self {
            room_id: room_id.into(),
            light_status: LightStatus::Off,
            mode: Mode::Auto,
            last_temperature: 0.0,
            last_light_level: 0,
            last_motion: false,
            updated_at: now,
        }
    }

    /// Caches a new reading. In AUTO the light follows motion, in MANUAL it is kept.
    pub fn observe(&mut self, temperature: f64, light_level: u32, motion: bool) {
        self.last_temperature = temperature;
        self.last_light_level = light_level;
        self.last_motion = motion;

        if self.mode == Mode::Auto {
            self.light_status = if motion { LightStatus::On } else { LightStatus::Off };
        }
    }

    /// `ON`/`OFF` pin the light in MANUAL. `AUTO` only switches the mode back; the
    /// light is re-evaluated by the next reading, not from `last_motion`.
    pub fn command(&mut self, action: Action) {
        match action.light_status() {
            Some(light_status) => {
                self.mode = Mode::Manual;
                self.light_status = light_status;
            }
            None => self.mode = Mode::Auto,
        }
    }
}

impl From<ControlState> for ControlStateResponse {
    fn from(state: ControlState) -> Self {
        Self {
            classroom_id: state.room_id,
            light_status: state.light_status,
            mode: state.mode,
            last_temperature: state.last_temperature,
            last_light_level: state.last_light_level,
            last_motion: state.last_motion,
            updated_at: state.updated_at,
        }
    }
}

#[derive(Clone)]
pub struct ControlStateTable;

impl Table for ControlStateTable {
    fn name(&self) -> &'static str {
        "control_states"
    }

    fn create(&self) -> String {
        String::from(
            r#"
            CREATE TABLE IF NOT EXISTS control_states (
                room_id TEXT PRIMARY KEY NOT NULL,
                light_status TEXT NOT NULL DEFAULT 'OFF' CHECK (light_status IN ('ON', 'OFF')),
                mode TEXT NOT NULL DEFAULT 'AUTO' CHECK (mode IN ('AUTO', 'MANUAL')),
                last_temperature REAL NOT NULL DEFAULT 0,
                last_light_level INTEGER NOT NULL DEFAULT 0,
                last_motion BOOLEAN NOT NULL DEFAULT 0,
                updated_at TIMESTAMP NOT NULL
            );
            "#,
        )
    }

    fn dispose(&self) -> String {
        String::from("DROP TABLE IF EXISTS control_states;")
    }

    fn dependencies(&self) -> Vec<&'static str> {
        vec![]
    }
}
