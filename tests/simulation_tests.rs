use browline::*;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Device world that records every delta it is asked to advance by.
struct RecordingWorld {
    inner: DeviceWorld,
    deltas: Rc<RefCell<Vec<f32>>>,
}

impl GameWorld for RecordingWorld {
    fn create_device_entity(&mut self) -> EntityId {
        self.inner.create_device_entity()
    }

    fn set_mode(&mut self, id: EntityId, mode: HudMode) {
        self.inner.set_mode(id, mode);
    }

    fn mode(&self, id: EntityId) -> HudMode {
        self.inner.mode(id)
    }

    fn set_power_state(&mut self, id: EntityId, state: PowerState) {
        self.inner.set_power_state(id, state);
    }

    fn power_state(&self, id: EntityId) -> PowerState {
        self.inner.power_state(id)
    }

    fn update_diagnostics(&mut self, id: EntityId, delta_ms: f32) -> DiagnosticsSnapshot {
        self.deltas.borrow_mut().push(delta_ms);
        self.inner.update_diagnostics(id, delta_ms)
    }

    fn diagnostics(&self, id: EntityId) -> DiagnosticsSnapshot {
        self.inner.diagnostics(id)
    }
}

fn recording_simulation() -> (HudSimulation<RecordingWorld, FrameQueue>, Rc<RefCell<Vec<f32>>>) {
    let deltas = Rc::new(RefCell::new(Vec::new()));
    let world = RecordingWorld {
        inner: DeviceWorld::seeded(21),
        deltas: Rc::clone(&deltas),
    };
    (HudSimulation::new(world, FrameQueue::new()), deltas)
}

fn counting_listener(simulation: &HudSimulation<DeviceWorld, FrameQueue>) -> (Rc<Cell<u32>>, Subscription) {
    let calls = Rc::new(Cell::new(0));
    let subscription = {
        let calls = Rc::clone(&calls);
        simulation.subscribe(move || calls.set(calls.get() + 1))
    };
    (calls, subscription)
}

fn simulation() -> HudSimulation<DeviceWorld, FrameQueue> {
    HudSimulation::new(DeviceWorld::seeded(17), FrameQueue::new())
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;

    #[test]
    fn test_start_stop_transitions() {
        let mut sim = simulation();
        assert_eq!(sim.state(), SimulationState::Idle);

        sim.start();
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(sim.scheduler().pending_count(), 1);

        sim.stop();
        assert_eq!(sim.state(), SimulationState::Idle);
        assert_eq!(sim.scheduler().pending_count(), 0);
    }

    #[test]
    fn test_start_while_running_is_noop() {
        let mut sim = simulation();
        sim.start();
        sim.start();

        assert_eq!(sim.scheduler().pending_count(), 1);
        assert_eq!(sim.scheduler().stats().total_requested, 1);
    }

    #[test]
    fn test_ticks_continue_until_stopped() {
        let mut sim = simulation();
        sim.start();

        for frame in 0..10 {
            assert!(sim.on_display_refresh(f64::from(frame) * 16.0));
        }
        assert_eq!(sim.frame_stats().ticks, 10);
        assert_eq!(sim.scheduler().pending_count(), 1);
    }

    #[test]
    fn test_stop_twice_matches_stop_once() {
        let mut sim = simulation();
        sim.start();
        sim.on_display_refresh(0.0);

        sim.stop();
        let after_first = (sim.state(), sim.scheduler().pending_count(), sim.snapshot());
        sim.stop();
        let after_second = (sim.state(), sim.scheduler().pending_count(), sim.snapshot());

        assert_eq!(after_first, after_second);
        assert_eq!(sim.scheduler().stats().total_cancelled, 1);
    }

    #[test]
    fn test_no_notification_after_stop() {
        let mut sim = simulation();
        let (calls, _subscription) = counting_listener(&sim);

        sim.start();
        assert!(sim.on_display_refresh(0.0));
        assert_eq!(calls.get(), 1);

        sim.stop();
        for frame in 1..5 {
            assert!(!sim.on_display_refresh(f64::from(frame) * 16.0));
        }
        assert_eq!(calls.get(), 1);
        assert_eq!(sim.frame_stats().ticks, 1);
    }

    #[test]
    fn test_first_delta_is_nominal_after_each_start() {
        let (mut sim, deltas) = recording_simulation();

        sim.start();
        sim.on_display_refresh(5000.0);
        sim.on_display_refresh(5020.0);
        sim.stop();

        sim.start();
        sim.on_display_refresh(90_000.0);
        sim.on_display_refresh(90_033.0);

        assert_eq!(*deltas.borrow(), vec![16.0, 20.0, 16.0, 33.0]);
    }

    #[test]
    fn test_nominal_delta_is_configurable() {
        let (sim, deltas) = recording_simulation();
        let mut sim = sim.with_nominal_frame_delta(8.0);

        sim.start();
        sim.on_display_refresh(100.0);
        assert_eq!(*deltas.borrow(), vec![8.0]);
    }

    #[test]
    fn test_backwards_timestamp_clamps_to_zero_delta() {
        let (mut sim, deltas) = recording_simulation();

        sim.start();
        sim.on_display_refresh(100.0);
        sim.on_display_refresh(50.0);

        assert_eq!(*deltas.borrow(), vec![16.0, 0.0]);
    }
}

#[cfg(test)]
mod snapshot_tests {
    use super::*;

    #[test]
    fn test_mode_visible_without_tick() {
        let mut sim = simulation();
        sim.set_mode(HudMode::Navigation);

        assert_eq!(sim.snapshot().mode, HudMode::Navigation);
        assert_eq!(sim.frame_stats().ticks, 0);
    }

    #[test]
    fn test_toggle_notifies_once_synchronously() {
        let mut sim = simulation();
        let (calls, _subscription) = counting_listener(&sim);

        sim.toggle_power();

        assert_eq!(calls.get(), 1);
        assert!(!sim.snapshot().is_powered);
    }

    #[test]
    fn test_toggle_power_flips_back() {
        let mut sim = simulation();
        sim.toggle_power();
        sim.toggle_power();
        assert!(sim.snapshot().is_powered);

        sim.set_power_state(PowerState::Off);
        assert!(!sim.snapshot().is_powered);
    }

    #[test]
    fn test_tick_publishes_new_diagnostics() {
        let mut sim = simulation();
        let before = sim.snapshot();

        sim.start();
        sim.on_display_refresh(0.0);
        let after = sim.snapshot();

        assert_ne!(before.diagnostics, after.diagnostics);
        assert_eq!(after.diagnostics, sim.world().diagnostics(sim.device_id()));
    }

    #[test]
    fn test_published_snapshot_is_not_affected_by_copies() {
        let mut sim = simulation();
        let published = sim.snapshot();

        let mut copy = (*published).clone();
        copy.mode = HudMode::Analysis;
        copy.diagnostics.cpu_load = 95.0;

        assert_eq!(sim.snapshot().mode, HudMode::System);
        assert_eq!(sim.snapshot().diagnostics.cpu_load, 42.0);

        sim.set_mode(HudMode::Navigation);
        let next = sim.snapshot();
        assert_eq!(next.diagnostics.cpu_load, 42.0);
        // Earlier snapshots keep their values.
        assert_eq!(published.mode, HudMode::System);
    }

    #[test]
    fn test_snapshot_reads_do_not_notify() {
        let sim = simulation();
        let (calls, _subscription) = counting_listener(&sim);

        let _ = sim.snapshot();
        let _ = sim.snapshot();
        assert_eq!(calls.get(), 0);
    }
}

#[cfg(test)]
mod listener_tests {
    use super::*;

    #[test]
    fn test_every_listener_notified_per_change() {
        let mut sim = simulation();
        let (first, _a) = counting_listener(&sim);
        let (second, _b) = counting_listener(&sim);

        sim.set_mode(HudMode::Analysis);
        sim.start();
        sim.on_display_refresh(0.0);

        assert_eq!(first.get(), 2);
        assert_eq!(second.get(), 2);
        assert_eq!(sim.listener_count(), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let mut sim = simulation();
        let (calls, subscription) = counting_listener(&sim);

        assert!(subscription.is_active());
        assert!(subscription.unsubscribe());
        assert!(!subscription.unsubscribe());
        assert!(!subscription.is_active());

        sim.toggle_power();
        assert_eq!(calls.get(), 0);
        assert_eq!(sim.listener_count(), 0);
    }

    #[test]
    fn test_unsubscribe_leaves_other_listeners() {
        let mut sim = simulation();
        let (removed, subscription) = counting_listener(&sim);
        let (kept, _kept_subscription) = counting_listener(&sim);

        subscription.unsubscribe();
        sim.toggle_power();

        assert_eq!(removed.get(), 0);
        assert_eq!(kept.get(), 1);
    }

    #[test]
    fn test_subscription_outliving_simulation() {
        let sim = simulation();
        let (_calls, subscription) = counting_listener(&sim);
        drop(sim);

        assert!(!subscription.is_active());
        assert!(!subscription.unsubscribe());
    }

    #[test]
    fn test_listener_rereads_snapshot_through_shared_state() {
        let mut sim = simulation();
        let dirty = Rc::new(Cell::new(false));
        let _subscription = {
            let dirty = Rc::clone(&dirty);
            sim.subscribe(move || dirty.set(true))
        };

        sim.set_mode(HudMode::Analysis);
        assert!(dirty.replace(false));
        assert_eq!(sim.snapshot().mode, HudMode::Analysis);
    }
}
