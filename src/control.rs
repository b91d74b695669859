//! Command surface of the HUD control panel.
//!
//! Console text such as `mode nav`, `power`, `power off`, `status` and `quit`
//! is parsed into a [`ControlCommand`] and applied to a [`HudSimulation`].

use crate::device::{HudMode, ParseHudModeError, ParsePowerStateError, PowerState};
use crate::scheduler::FrameScheduler;
use crate::simulation::HudSimulation;
use crate::world::GameWorld;
use core::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    SetMode(HudMode),
    TogglePower,
    SetPower(PowerState),
    Status,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControlError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error("missing argument for '{0}'")]
    MissingArgument(&'static str),
    #[error(transparent)]
    UnknownMode(#[from] ParseHudModeError),
    #[error(transparent)]
    UnknownPowerState(#[from] ParsePowerStateError),
    #[error("HUD mode cannot change while the device is powered off")]
    PoweredOff,
}

/// What a host should do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlOutcome {
    /// The snapshot changed and listeners were notified.
    Applied,
    /// Nothing changed; the host should show the current snapshot.
    ShowStatus,
    Quit,
}

impl FromStr for ControlCommand {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(ControlError::Empty);
        };
        let argument = words.next();

        match verb.to_ascii_lowercase().as_str() {
            "mode" => {
                let mode = argument.ok_or(ControlError::MissingArgument("mode"))?;
                Ok(ControlCommand::SetMode(mode.parse()?))
            }
            "power" => match argument {
                None | Some("toggle") => Ok(ControlCommand::TogglePower),
                Some(state) => Ok(ControlCommand::SetPower(state.parse()?)),
            },
            "status" => Ok(ControlCommand::Status),
            "quit" | "exit" => Ok(ControlCommand::Quit),
            // Bare mode names act like the panel's mode buttons.
            other => other
                .parse::<HudMode>()
                .map(ControlCommand::SetMode)
                .map_err(|_| ControlError::UnknownCommand(verb.to_string())),
        }
    }
}

impl ControlCommand {
    /// Applies the command to `simulation`.
    ///
    /// Mode changes are refused while the device is unpowered, mirroring the
    /// disabled mode buttons of the control panel.
    pub fn apply<W, S>(self, simulation: &mut HudSimulation<W, S>) -> Result<ControlOutcome, ControlError>
    where
        W: GameWorld,
        S: FrameScheduler,
    {
        match self {
            ControlCommand::SetMode(mode) => {
                if !simulation.snapshot().is_powered {
                    warn!(%mode, "mode change rejected while powered off");
                    return Err(ControlError::PoweredOff);
                }
                simulation.set_mode(mode);
                Ok(ControlOutcome::Applied)
            }
            ControlCommand::TogglePower => {
                simulation.toggle_power();
                Ok(ControlOutcome::Applied)
            }
            ControlCommand::SetPower(state) => {
                simulation.set_power_state(state);
                Ok(ControlOutcome::Applied)
            }
            ControlCommand::Status => Ok(ControlOutcome::ShowStatus),
            ControlCommand::Quit => Ok(ControlOutcome::Quit),
        }
    }
}
