//! # Browline HUD Simulation Core
//!
//! Drives the device diagnostics shown on an AR-glasses heads-up display and
//! distributes immutable snapshots of them to any number of renderers.
//!
//! ## Features
//!
//! - **Bounded diagnostics walk**: CPU, memory, network, temperature, wind and
//!   humidity drift per frame, always clamped to their ranges
//! - **Device world**: mode, power state and diagnostics per device entity
//! - **Frame-driven driver**: cancellable per-frame ticks with a nominal first delta
//! - **Snapshot listeners**: synchronous change notification with explicit unsubscribe
//! - **Control surface**: text commands for the mode and power controls
//!
//! ## Quick Start
//!
//! ```rust
//! use browline::{DeviceWorld, FrameQueue, HudMode, HudSimulation};
//!
//! let mut simulation = HudSimulation::new(DeviceWorld::seeded(7), FrameQueue::new());
//! let _subscription = simulation.subscribe(|| println!("snapshot changed"));
//!
//! simulation.start();
//! simulation.on_display_refresh(0.0);
//! simulation.on_display_refresh(16.0);
//!
//! simulation.set_mode(HudMode::Navigation);
//! assert_eq!(simulation.snapshot().mode, HudMode::Navigation);
//!
//! simulation.stop();
//! ```
//!
//! ## Architecture
//!
//! - [`device`] - Entity ids, HUD mode and power state
//! - [`diagnostics`] - Diagnostics value model and per-tick update rule
//! - [`world`] - Device entity storage
//! - [`scheduler`] - Frame callback requests and cancellation
//! - [`simulation`] - Frame loop, snapshot cache and listeners
//! - [`telemetry`] - Text readout and JSON frames for consumers
//! - [`control`] - Control panel commands
//! - [`config`] - Run configuration

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::must_use_candidate)]

pub mod config;
pub mod control;
pub mod device;
pub mod diagnostics;
pub mod scheduler;
pub mod simulation;
pub mod telemetry;
pub mod world;

// Re-export main public types for convenience
pub use config::SimulationConfig;
pub use control::{ControlCommand, ControlError, ControlOutcome};
pub use device::{EntityId, HudMode, PowerState};
pub use diagnostics::{
    CardinalDirection, DeviceSpecifications, DiagnosticsSnapshot, DiagnosticsSystem,
    NetworkConnection,
};
pub use scheduler::{FrameHandle, FrameQueue, FrameScheduler};
pub use simulation::{HudSimulation, HudSnapshot, SimulationState, Subscription};
pub use telemetry::{HudReadout, TelemetryFrame, TelemetrySampler};
pub use world::{DeviceWorld, GameWorld};
