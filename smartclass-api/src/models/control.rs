use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{ParseEnumError, RoomId};

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LightStatus {
    On,
    #[default]
    Off,
}

impl LightStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LightStatus::On => "ON",
            LightStatus::Off => "OFF",
        }
    }
}

impl fmt::Display for LightStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightStatus {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ON" => Ok(LightStatus::On),
            "OFF" => Ok(LightStatus::Off),
            _ => Err(ParseEnumError {
                kind: "light status",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for LightStatus {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// How the light status of a room is decided.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    /// Light follows the most recent motion reading
    #[default]
    Auto,
    /// Light is pinned by an operator command
    Manual,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Auto => "AUTO",
            Mode::Manual => "MANUAL",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "AUTO" => Ok(Mode::Auto),
            "MANUAL" => Ok(Mode::Manual),
            _ => Err(ParseEnumError {
                kind: "mode",
                value: value.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Operator command. Parsing is case-sensitive.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    On,
    Off,
    Auto,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::On => "ON",
            Action::Off => "OFF",
            Action::Auto => "AUTO",
        }
    }

    /// The light status this action pins, `None` for [`Action::Auto`].
    pub fn light_status(&self) -> Option<LightStatus> {
        match self {
            Action::On => Some(LightStatus::On),
            Action::Off => Some(LightStatus::Off),
            Action::Auto => None,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Action {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "ON" => Ok(Action::On),
            "OFF" => Ok(Action::Off),
            "AUTO" => Ok(Action::Auto),
            _ => Err(ParseEnumError {
                kind: "action",
                value: value.to_string(),
            }),
        }
    }
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlRequest {
    /// Target classroom
    #[serde(alias = "room_id")]
    pub classroom_id: RoomId,
    /// One of `ON`, `OFF`, `AUTO`. Kept as text so an unknown action is reported as such.
    pub action: String,
}

#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlResponse {
    pub status: String,
    /// The action that was applied
    pub action: Action,
}

impl ControlResponse {
    pub fn success(action: Action) -> Self {
        Self {
            status: String::from("success"),
            action,
        }
    }
}
