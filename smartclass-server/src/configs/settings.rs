use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::configs::normalize_path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

/// What to do with telemetry naming a room that was never registered.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownRoomPolicy {
    #[default]
    Reject,
    Provision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rooms {
    /// Rooms registered with default state at startup
    #[serde(default)]
    pub seed: Vec<String>,
    #[serde(default)]
    pub unknown_policy: UnknownRoomPolicy,
    /// Room assumed for telemetry that carries no room id; unset means reject
    #[serde(default)]
    pub default_room: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct History {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for History {
    fn default() -> Self {
        Self {
            default_limit: 10,
            max_limit: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub rooms: Rooms,
    #[serde(default)]
    pub history: History,
}

/// `SERVER__PORT=8080` overrides `server.port`; single underscores stay part of a key.
fn environment() -> Environment {
    Environment::default().separator("__")
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        if let Some(migrate) = &settings.database.migration_path {
            let migrate_path = normalize_path(migrate)
                .map_err(|e| ConfigError::Message(e.to_string()))?;

            settings.database.migration_path = if migrate_path.is_dir() {
                Some(migrate_path.to_string_lossy().to_string())
            } else {
                None
            };
        }

        settings.validate()?;

        Ok(settings)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rooms.seed.iter().any(|room| room.trim().is_empty()) {
            return Err(ConfigError::Message("rooms.seed contains an empty room id".into()));
        }

        if let Some(room) = &self.rooms.default_room {
            if room.trim().is_empty() {
                return Err(ConfigError::Message("rooms.default_room must not be empty".into()));
            }
        }

        if self.history.default_limit > self.history.max_limit {
            return Err(ConfigError::Message(
                "history.default_limit exceeds history.max_limit".into(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message("database.max_connections must be positive".into()));
        }

        Ok(())
    }
}

impl Database {
    pub fn is_memory(&self) -> bool {
        self.url.contains(":memory:") || self.url.contains("mode=memory")
    }
}
