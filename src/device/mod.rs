//! Per-device components: the entity identifier, HUD mode and power state.

use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// Opaque identifier of one simulated device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(u32);

impl EntityId {
    pub(crate) const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum HudMode {
    #[default]
    System,
    Navigation,
    Analysis,
}

impl HudMode {
    pub const ALL: [HudMode; 3] = [HudMode::System, HudMode::Navigation, HudMode::Analysis];

    pub fn label(self) -> &'static str {
        match self {
            HudMode::System => "System",
            HudMode::Navigation => "Navigation",
            HudMode::Analysis => "Analysis",
        }
    }

    /// Caption used on the control panel buttons.
    pub fn short_label(self) -> &'static str {
        match self {
            HudMode::System => "SYS",
            HudMode::Navigation => "NAV",
            HudMode::Analysis => "SCAN",
        }
    }
}

impl fmt::Display for HudMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error returned when text names no known [`HudMode`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown HUD mode '{0}'")]
pub struct ParseHudModeError(pub String);

impl FromStr for HudMode {
    type Err = ParseHudModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HudMode::ALL
            .into_iter()
            .find(|mode| {
                mode.label().eq_ignore_ascii_case(wanted)
                    || mode.short_label().eq_ignore_ascii_case(wanted)
            })
            .ok_or_else(|| ParseHudModeError(wanted.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerState {
    Off,
    #[default]
    On,
}

impl PowerState {
    pub fn is_powered(self) -> bool {
        self == PowerState::On
    }

    pub fn toggled(self) -> Self {
        match self {
            PowerState::On => PowerState::Off,
            PowerState::Off => PowerState::On,
        }
    }

    /// Sign applied to the power-driven drift terms of the update rule.
    pub(crate) fn drift_sign(self) -> f32 {
        if self.is_powered() {
            1.0
        } else {
            -1.0
        }
    }
}

impl fmt::Display for PowerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PowerState::On => "On",
            PowerState::Off => "Off",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown power state '{0}'")]
pub struct ParsePowerStateError(pub String);

impl FromStr for PowerState {
    type Err = ParsePowerStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "on" | "enable" => Ok(PowerState::On),
            "off" | "disable" => Ok(PowerState::Off),
            other => Err(ParsePowerStateError(other.to_string())),
        }
    }
}
