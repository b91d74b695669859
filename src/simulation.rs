//! Simulation driver: frame loop, cached [`HudSnapshot`] and change listeners.
//!
//! The driver owns one device in a [`GameWorld`] and advances its diagnostics
//! once per frame callback obtained from a [`FrameScheduler`]. After every
//! change it publishes a fresh, immutable snapshot and invokes each listener
//! synchronously with no arguments; listeners re-read [`HudSimulation::snapshot`].
//!
//! Everything runs on one logical thread. Listeners are notified from a copy
//! of the registry, so a listener may unsubscribe itself (or others) while
//! being notified.

use crate::device::{EntityId, HudMode, PowerState};
use crate::diagnostics::DiagnosticsSnapshot;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::world::GameWorld;
use heapless::HistoryBuffer;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use tracing::{debug, info, trace};

/// Delta used for the first tick after `start`, in milliseconds.
pub const NOMINAL_FRAME_DELTA_MS: f32 = 16.0;

const FRAME_HISTORY_LEN: usize = 16;

/// What renderers draw from. Published behind an [`Arc`]; never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HudSnapshot {
    pub mode: HudMode,
    pub is_powered: bool,
    pub diagnostics: DiagnosticsSnapshot,
}

assert_impl_all!(HudSnapshot: Send, Sync, Clone);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimulationState {
    Idle,
    Running,
}

#[derive(Debug)]
pub struct FrameStats {
    pub ticks: u64,
    pub last_delta_ms: f32,
    recent_deltas: HistoryBuffer<f32, FRAME_HISTORY_LEN>,
}

impl FrameStats {
    fn new() -> Self {
        Self {
            ticks: 0,
            last_delta_ms: 0.0,
            recent_deltas: HistoryBuffer::new(),
        }
    }

    fn record(&mut self, delta_ms: f32) {
        self.ticks += 1;
        self.last_delta_ms = delta_ms;
        self.recent_deltas.write(delta_ms);
    }

    /// Mean of the most recent frame deltas, `None` before the first tick.
    pub fn average_delta_ms(&self) -> Option<f32> {
        let recent = self.recent_deltas.as_slice();
        if recent.is_empty() {
            return None;
        }
        Some(recent.iter().sum::<f32>() / recent.len() as f32)
    }
}

type Listener = Rc<dyn Fn()>;

#[derive(Default)]
struct ListenerRegistry {
    listeners: BTreeMap<u64, Listener>,
    next_id: u64,
}

/// Handle returned by [`HudSimulation::subscribe`].
///
/// Dropping it does not unsubscribe; call [`Subscription::unsubscribe`].
#[must_use = "keep the subscription to be able to unsubscribe"]
#[derive(Debug, Clone)]
pub struct Subscription {
    id: u64,
    registry: Weak<RefCell<ListenerRegistry>>,
}

impl Subscription {
    /// Removes the listener. Returns `true` only on the call that removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let removed = registry.borrow_mut().listeners.remove(&self.id);
        removed.is_some()
    }

    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let active = registry.borrow().listeners.contains_key(&self.id);
        active
    }
}

pub struct HudSimulation<W: GameWorld, S: FrameScheduler> {
    world: W,
    scheduler: S,
    device_id: EntityId,
    state: SimulationState,
    pending_frame: Option<FrameHandle>,
    last_timestamp_ms: Option<f64>,
    nominal_frame_delta_ms: f32,
    snapshot: Arc<HudSnapshot>,
    listeners: Rc<RefCell<ListenerRegistry>>,
    stats: FrameStats,
}

impl<W: GameWorld, S: FrameScheduler> HudSimulation<W, S> {
    /// Creates the driver's device in `world` and captures its first snapshot.
    pub fn new(mut world: W, scheduler: S) -> Self {
        let device_id = world.create_device_entity();
        let snapshot = Arc::new(Self::read_snapshot(&world, device_id, None));

        Self {
            world,
            scheduler,
            device_id,
            state: SimulationState::Idle,
            pending_frame: None,
            last_timestamp_ms: None,
            nominal_frame_delta_ms: NOMINAL_FRAME_DELTA_MS,
            snapshot,
            listeners: Rc::new(RefCell::new(ListenerRegistry::default())),
            stats: FrameStats::new(),
        }
    }

    pub fn with_nominal_frame_delta(mut self, delta_ms: f32) -> Self {
        self.nominal_frame_delta_ms = delta_ms;
        self
    }

    pub fn start(&mut self) {
        if self.state == SimulationState::Running {
            return;
        }

        self.state = SimulationState::Running;
        self.pending_frame = Some(self.scheduler.request_frame());
        info!(device = %self.device_id, "simulation started");
    }

    pub fn stop(&mut self) {
        if self.state == SimulationState::Idle {
            return;
        }

        if let Some(handle) = self.pending_frame.take() {
            self.scheduler.cancel_frame(handle);
        }
        self.state = SimulationState::Idle;
        self.last_timestamp_ms = None;
        info!(device = %self.device_id, ticks = self.stats.ticks, "simulation stopped");
    }

    /// Host hook for one display refresh at `timestamp_ms`.
    ///
    /// Ticks only when the frame this driver requested is due and the driver
    /// is still running. Returns whether a tick happened.
    pub fn on_display_refresh(&mut self, timestamp_ms: f64) -> bool {
        let Some(handle) = self.scheduler.poll_due() else {
            return false;
        };

        if self.state != SimulationState::Running || self.pending_frame != Some(handle) {
            trace!(frame = handle.id(), "stale frame ignored");
            return false;
        }

        self.pending_frame = None;
        self.step(timestamp_ms);
        true
    }

    pub fn set_mode(&mut self, mode: HudMode) {
        self.world.set_mode(self.device_id, mode);
        debug!(device = %self.device_id, %mode, "mode changed");
        self.publish(None);
    }

    pub fn toggle_power(&mut self) {
        let next = self.world.power_state(self.device_id).toggled();
        self.set_power_state(next);
    }

    pub fn set_power_state(&mut self, state: PowerState) {
        self.world.set_power_state(self.device_id, state);
        debug!(device = %self.device_id, %state, "power state changed");
        self.publish(None);
    }

    /// Current snapshot; cheap to clone, read-only to every holder.
    pub fn snapshot(&self) -> Arc<HudSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// Registers `listener` to run after every snapshot change.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + 'static,
    {
        let mut registry = self.listeners.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Rc::new(listener));

        Subscription {
            id,
            registry: Rc::downgrade(&self.listeners),
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().listeners.len()
    }

    pub fn state(&self) -> SimulationState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SimulationState::Running
    }

    pub fn device_id(&self) -> EntityId {
        self.device_id
    }

    pub fn frame_stats(&self) -> &FrameStats {
        &self.stats
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    fn step(&mut self, timestamp_ms: f64) {
        let delta_ms = match self.last_timestamp_ms {
            Some(last) => (timestamp_ms - last).max(0.0) as f32,
            None => self.nominal_frame_delta_ms,
        };
        self.last_timestamp_ms = Some(timestamp_ms);

        let diagnostics = self.world.update_diagnostics(self.device_id, delta_ms);
        self.stats.record(delta_ms);
        trace!(tick = self.stats.ticks, delta_ms, "diagnostics advanced");

        self.publish(Some(diagnostics));
        self.pending_frame = Some(self.scheduler.request_frame());
    }

    fn publish(&mut self, diagnostics: Option<DiagnosticsSnapshot>) {
        self.snapshot = Arc::new(Self::read_snapshot(&self.world, self.device_id, diagnostics));
        self.notify();
    }

    fn notify(&self) {
        let listeners: Vec<Listener> = self.listeners.borrow().listeners.values().cloned().collect();
        for listener in listeners {
            listener();
        }
    }

    fn read_snapshot(
        world: &W,
        device_id: EntityId,
        diagnostics: Option<DiagnosticsSnapshot>,
    ) -> HudSnapshot {
        HudSnapshot {
            mode: world.mode(device_id),
            is_powered: world.power_state(device_id).is_powered(),
            diagnostics: diagnostics.unwrap_or_else(|| world.diagnostics(device_id)),
        }
    }
}

impl<W: GameWorld, S: FrameScheduler> Drop for HudSimulation<W, S> {
    fn drop(&mut self) {
        self.stop();
    }
}
