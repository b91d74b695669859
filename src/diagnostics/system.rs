use super::{
    CardinalDirection, DiagnosticsSnapshot, NetworkConnection, CPU_LOAD_MAX, CPU_LOAD_MIN,
    HUMIDITY_MAX_PERCENT, HUMIDITY_MIN_PERCENT, MEMORY_USAGE_MIN, NETWORK_STRENGTH_MAX,
    NETWORK_STRENGTH_MIN, TEMPERATURE_MAX_C, TEMPERATURE_MIN_C, WIND_SPEED_MAX_KMH,
    WIND_SPEED_MIN_KMH,
};
use crate::device::PowerState;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Frame length the noise amplitudes are tuned for (~60 Hz).
pub const REFERENCE_FRAME_MS: f32 = 16.67;

const CPU_NOISE: f32 = 0.08;
const CPU_DRIFT: f32 = 0.02;
const MEMORY_NOISE: f32 = 0.03;
const MEMORY_DRIFT: f32 = 0.01;
const NETWORK_NOISE: f32 = 0.002;
const TEMPERATURE_NOISE: f32 = 0.001;
const TEMPERATURE_DRIFT: f32 = 0.005;
const WIND_SPEED_NOISE: f32 = 0.01;
const HUMIDITY_NOISE: f32 = 0.005;

/// A draw above this value shifts the wind one step clockwise.
const WIND_SHIFT_THRESHOLD: f32 = 0.98;

/// Per-tick diagnostics update rule: bounded random walk plus power drift.
#[derive(Debug)]
pub struct DiagnosticsSystem<R = StdRng> {
    rng: R,
}

impl DiagnosticsSystem<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Reproducible system; the same seed yields the same walk.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for DiagnosticsSystem<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> DiagnosticsSystem<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Advances `current` by `delta_ms` and returns the new readings.
    ///
    /// Every bounded field is clamped after its delta is added. A negative or
    /// non-finite `delta_ms` is treated as zero elapsed time.
    pub fn update(
        &mut self,
        current: &DiagnosticsSnapshot,
        power: PowerState,
        delta_ms: f32,
    ) -> DiagnosticsSnapshot {
        let time_scale = time_scale(delta_ms);
        let drift = power.drift_sign();
        let mut next = *current;

        next.cpu_load = clamp(
            current.cpu_load + self.noise(CPU_NOISE, time_scale) + drift * CPU_DRIFT,
            CPU_LOAD_MIN,
            CPU_LOAD_MAX,
        );

        next.memory_usage = clamp(
            current.memory_usage + self.noise(MEMORY_NOISE, time_scale) + drift * MEMORY_DRIFT,
            MEMORY_USAGE_MIN,
            current.memory_usage_max(),
        );

        next.network_strength = clamp(
            current.network_strength + self.noise(NETWORK_NOISE, time_scale),
            NETWORK_STRENGTH_MIN,
            NETWORK_STRENGTH_MAX,
        );
        next.network_connection = NetworkConnection::from_strength(next.network_strength);

        next.temperature_c = clamp(
            current.temperature_c
                + self.noise(TEMPERATURE_NOISE, time_scale)
                + drift * TEMPERATURE_DRIFT,
            TEMPERATURE_MIN_C,
            TEMPERATURE_MAX_C,
        );

        next.wind_speed_kmh = clamp(
            current.wind_speed_kmh + self.noise(WIND_SPEED_NOISE, time_scale),
            WIND_SPEED_MIN_KMH,
            WIND_SPEED_MAX_KMH,
        );

        next.wind_direction = self.drift_wind(current.wind_direction);

        next.humidity_percent = clamp(
            current.humidity_percent + self.noise(HUMIDITY_NOISE, time_scale),
            HUMIDITY_MIN_PERCENT,
            HUMIDITY_MAX_PERCENT,
        );

        next
    }

    fn noise(&mut self, amplitude: f32, time_scale: f32) -> f32 {
        self.rng.gen_range(-1.0f32..=1.0) * amplitude * time_scale
    }

    // Independent of elapsed time: one chance per tick.
    fn drift_wind(&mut self, direction: CardinalDirection) -> CardinalDirection {
        if self.rng.gen::<f32>() > WIND_SHIFT_THRESHOLD {
            direction.next()
        } else {
            direction
        }
    }
}

fn time_scale(delta_ms: f32) -> f32 {
    if delta_ms.is_finite() && delta_ms > 0.0 {
        delta_ms / REFERENCE_FRAME_MS
    } else {
        0.0
    }
}

fn clamp(value: f32, min: f32, max: f32) -> f32 {
    value.max(min).min(max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delta_applies_only_drift() {
        let mut system = DiagnosticsSystem::seeded(7);
        let start = DiagnosticsSnapshot::default();

        let next = system.update(&start, PowerState::On, 0.0);
        assert!((next.cpu_load - (start.cpu_load + CPU_DRIFT)).abs() < 1e-4);
        assert!((next.memory_usage - (start.memory_usage + MEMORY_DRIFT)).abs() < 1e-4);
        assert_eq!(next.network_strength, start.network_strength);
        assert_eq!(next.humidity_percent, start.humidity_percent);

        let next = system.update(&start, PowerState::Off, f32::NAN);
        assert!((next.temperature_c - (start.temperature_c - TEMPERATURE_DRIFT)).abs() < 1e-4);
    }

    #[test]
    fn test_clamp_applies_after_delta() {
        let mut system = DiagnosticsSystem::seeded(11);
        let pinned = DiagnosticsSnapshot {
            cpu_load: CPU_LOAD_MAX,
            temperature_c: TEMPERATURE_MAX_C,
            network_strength: NETWORK_STRENGTH_MIN,
            network_connection: NetworkConnection::None,
            ..DiagnosticsSnapshot::default()
        };

        for _ in 0..200 {
            let next = system.update(&pinned, PowerState::On, 500.0);
            assert!(next.cpu_load <= CPU_LOAD_MAX);
            assert!(next.temperature_c <= TEMPERATURE_MAX_C);
            assert!(next.network_strength >= NETWORK_STRENGTH_MIN);
        }
    }

    #[test]
    fn test_same_seed_same_walk() {
        let mut a = DiagnosticsSystem::seeded(42);
        let mut b = DiagnosticsSystem::seeded(42);
        let mut left = DiagnosticsSnapshot::default();
        let mut right = left;

        for _ in 0..50 {
            left = a.update(&left, PowerState::On, 16.0);
            right = b.update(&right, PowerState::On, 16.0);
        }
        assert_eq!(left, right);
    }

    #[test]
    fn test_time_scale_normalizes_to_reference_frame() {
        assert!((time_scale(REFERENCE_FRAME_MS) - 1.0).abs() < f32::EPSILON);
        assert_eq!(time_scale(-5.0), 0.0);
        assert_eq!(time_scale(f32::INFINITY), 0.0);
    }
}
