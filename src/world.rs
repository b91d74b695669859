//! Entity storage for simulated devices.
//!
//! The world is the single source of truth for each device's mode, power
//! state and diagnostics. It is total: lookups on an id the world never
//! allocated resolve to an unpowered device in [`HudMode::System`] with the
//! default diagnostics, and writes to such an id are ignored.

use crate::device::{EntityId, HudMode, PowerState};
use crate::diagnostics::{DeviceSpecifications, DiagnosticsSnapshot, DiagnosticsSystem};
use rand::rngs::StdRng;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Mode reported for an id the world does not know.
pub const UNKNOWN_ENTITY_MODE: HudMode = HudMode::System;
/// Power state reported for an id the world does not know.
pub const UNKNOWN_ENTITY_POWER: PowerState = PowerState::Off;

/// Operations the simulation driver needs from a device store.
pub trait GameWorld {
    fn create_device_entity(&mut self) -> EntityId;
    fn set_mode(&mut self, id: EntityId, mode: HudMode);
    fn mode(&self, id: EntityId) -> HudMode;
    fn set_power_state(&mut self, id: EntityId, state: PowerState);
    fn power_state(&self, id: EntityId) -> PowerState;
    /// Advances the device's diagnostics by `delta_ms`, stores and returns them.
    fn update_diagnostics(&mut self, id: EntityId, delta_ms: f32) -> DiagnosticsSnapshot;
    fn diagnostics(&self, id: EntityId) -> DiagnosticsSnapshot;
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DeviceRecord {
    mode: HudMode,
    power: PowerState,
    diagnostics: DiagnosticsSnapshot,
}

#[derive(Debug)]
pub struct DeviceWorld<R = StdRng> {
    devices: BTreeMap<EntityId, DeviceRecord>,
    specifications: DeviceSpecifications,
    diagnostics_system: DiagnosticsSystem<R>,
    next_entity_id: u32,
}

impl DeviceWorld<StdRng> {
    pub fn new() -> Self {
        Self::with_parts(DeviceSpecifications::default(), DiagnosticsSystem::new())
    }

    pub fn seeded(seed: u64) -> Self {
        Self::with_parts(DeviceSpecifications::default(), DiagnosticsSystem::seeded(seed))
    }
}

impl Default for DeviceWorld<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DeviceWorld<R> {
    pub fn with_parts(
        specifications: DeviceSpecifications,
        diagnostics_system: DiagnosticsSystem<R>,
    ) -> Self {
        Self {
            devices: BTreeMap::new(),
            specifications,
            diagnostics_system,
            next_entity_id: 1,
        }
    }

    pub fn entity_count(&self) -> usize {
        self.devices.len()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.devices.contains_key(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.devices.keys().copied()
    }

    pub fn specifications(&self) -> &DeviceSpecifications {
        &self.specifications
    }
}

impl<R: Rng> GameWorld for DeviceWorld<R> {
    fn create_device_entity(&mut self) -> EntityId {
        let id = EntityId::from_raw(self.next_entity_id);
        self.next_entity_id = self.next_entity_id.wrapping_add(1);

        self.devices.insert(
            id,
            DeviceRecord {
                mode: HudMode::System,
                power: PowerState::On,
                diagnostics: self.specifications.create_diagnostics_snapshot(),
            },
        );

        debug!(%id, "device entity created");
        id
    }

    fn set_mode(&mut self, id: EntityId, mode: HudMode) {
        match self.devices.get_mut(&id) {
            Some(record) => record.mode = mode,
            None => warn!(%id, ?mode, "set_mode ignored for unknown entity"),
        }
    }

    fn mode(&self, id: EntityId) -> HudMode {
        self.devices.get(&id).map_or(UNKNOWN_ENTITY_MODE, |record| record.mode)
    }

    fn set_power_state(&mut self, id: EntityId, state: PowerState) {
        match self.devices.get_mut(&id) {
            Some(record) => record.power = state,
            None => warn!(%id, ?state, "set_power_state ignored for unknown entity"),
        }
    }

    fn power_state(&self, id: EntityId) -> PowerState {
        self.devices.get(&id).map_or(UNKNOWN_ENTITY_POWER, |record| record.power)
    }

    fn update_diagnostics(&mut self, id: EntityId, delta_ms: f32) -> DiagnosticsSnapshot {
        let Some(record) = self.devices.get_mut(&id) else {
            warn!(%id, "update_diagnostics on unknown entity");
            return self.specifications.create_diagnostics_snapshot();
        };

        record.diagnostics = self
            .diagnostics_system
            .update(&record.diagnostics, record.power, delta_ms);
        record.diagnostics
    }

    fn diagnostics(&self, id: EntityId) -> DiagnosticsSnapshot {
        self.devices.get(&id).map_or_else(
            || self.specifications.create_diagnostics_snapshot(),
            |record| record.diagnostics,
        )
    }
}
