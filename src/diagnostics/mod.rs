pub mod system;

pub use system::DiagnosticsSystem;

use core::fmt;
use serde::{Deserialize, Serialize};
use static_assertions::assert_impl_all;

pub const CPU_LOAD_MIN: f32 = 8.0;
pub const CPU_LOAD_MAX: f32 = 96.0;
pub const MEMORY_USAGE_MIN: f32 = 6.0;
/// Headroom kept between memory usage and capacity.
pub const MEMORY_HEADROOM: f32 = 2.0;
pub const NETWORK_STRENGTH_MIN: f32 = 0.0;
pub const NETWORK_STRENGTH_MAX: f32 = 1.0;
/// Strength strictly above which the cellular link counts as connected.
pub const NETWORK_LINK_THRESHOLD: f32 = 0.2;
pub const TEMPERATURE_MIN_C: f32 = 18.0;
pub const TEMPERATURE_MAX_C: f32 = 36.0;
pub const WIND_SPEED_MIN_KMH: f32 = 2.0;
pub const WIND_SPEED_MAX_KMH: f32 = 24.0;
pub const HUMIDITY_MIN_PERCENT: f32 = 20.0;
pub const HUMIDITY_MAX_PERCENT: f32 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NetworkConnection {
    #[default]
    None,
    Cellular5G,
}

impl NetworkConnection {
    pub fn from_strength(strength: f32) -> Self {
        if strength > NETWORK_LINK_THRESHOLD {
            NetworkConnection::Cellular5G
        } else {
            NetworkConnection::None
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            NetworkConnection::Cellular5G => "5G",
            NetworkConnection::None => "Offline",
        }
    }
}

/// Eight-way compass direction; advancing wraps from `NorthWest` to `North`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardinalDirection {
    North,
    NorthEast,
    East,
    SouthEast,
    South,
    SouthWest,
    West,
    NorthWest,
}

impl CardinalDirection {
    pub const COUNT: u8 = 8;

    const ORDER: [CardinalDirection; Self::COUNT as usize] = [
        CardinalDirection::North,
        CardinalDirection::NorthEast,
        CardinalDirection::East,
        CardinalDirection::SouthEast,
        CardinalDirection::South,
        CardinalDirection::SouthWest,
        CardinalDirection::West,
        CardinalDirection::NorthWest,
    ];

    pub fn from_index(index: u8) -> Self {
        Self::ORDER[usize::from(index % Self::COUNT)]
    }

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Self {
        Self::from_index(self.index() + 1)
    }

    pub fn label(self) -> &'static str {
        match self {
            CardinalDirection::North => "N",
            CardinalDirection::NorthEast => "NE",
            CardinalDirection::East => "E",
            CardinalDirection::SouthEast => "SE",
            CardinalDirection::South => "S",
            CardinalDirection::SouthWest => "SW",
            CardinalDirection::West => "W",
            CardinalDirection::NorthWest => "NW",
        }
    }
}

impl fmt::Display for CardinalDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Bounded diagnostics readings of one device at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticsSnapshot {
    pub cpu_load: f32,
    pub memory_usage: f32,
    pub memory_capacity: f32,
    pub network_strength: f32,
    pub network_connection: NetworkConnection,
    pub temperature_c: f32,
    pub wind_speed_kmh: f32,
    pub wind_direction: CardinalDirection,
    pub humidity_percent: f32,
}

assert_impl_all!(DiagnosticsSnapshot: Copy, Send, Sync);

/// A reading that fell outside its allowed interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundsViolation {
    pub field: &'static str,
    pub value: f32,
    pub min: f32,
    pub max: f32,
}

impl fmt::Display for BoundsViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {} outside [{}, {}]", self.field, self.value, self.min, self.max)
    }
}

impl DiagnosticsSnapshot {
    pub fn memory_usage_max(&self) -> f32 {
        self.memory_capacity - MEMORY_HEADROOM
    }

    /// Lists every field outside its interval, including a network link
    /// that disagrees with the reported strength.
    pub fn check_bounds(&self) -> Vec<BoundsViolation> {
        let ranges = [
            ("cpu_load", self.cpu_load, CPU_LOAD_MIN, CPU_LOAD_MAX),
            ("memory_usage", self.memory_usage, MEMORY_USAGE_MIN, self.memory_usage_max()),
            (
                "network_strength",
                self.network_strength,
                NETWORK_STRENGTH_MIN,
                NETWORK_STRENGTH_MAX,
            ),
            ("temperature_c", self.temperature_c, TEMPERATURE_MIN_C, TEMPERATURE_MAX_C),
            ("wind_speed_kmh", self.wind_speed_kmh, WIND_SPEED_MIN_KMH, WIND_SPEED_MAX_KMH),
            (
                "humidity_percent",
                self.humidity_percent,
                HUMIDITY_MIN_PERCENT,
                HUMIDITY_MAX_PERCENT,
            ),
        ];

        let mut violations: Vec<BoundsViolation> = ranges
            .into_iter()
            .filter(|&(_, value, min, max)| !(min..=max).contains(&value))
            .map(|(field, value, min, max)| BoundsViolation { field, value, min, max })
            .collect();

        if self.network_connection != NetworkConnection::from_strength(self.network_strength) {
            violations.push(BoundsViolation {
                field: "network_connection",
                value: self.network_strength,
                min: NETWORK_LINK_THRESHOLD,
                max: NETWORK_STRENGTH_MAX,
            });
        }

        violations
    }

    pub fn is_within_bounds(&self) -> bool {
        self.check_bounds().is_empty()
    }
}

impl Default for DiagnosticsSnapshot {
    fn default() -> Self {
        Self {
            cpu_load: 42.0,
            memory_usage: 12.0,
            memory_capacity: 64.0,
            network_strength: 0.9,
            network_connection: NetworkConnection::Cellular5G,
            temperature_c: 24.0,
            wind_speed_kmh: 12.0,
            wind_direction: CardinalDirection::NorthWest,
            humidity_percent: 45.0,
        }
    }
}

/// Factory for the diagnostics every new device starts from.
///
/// The default snapshot is always within bounds, so the update rule can keep
/// every field inside its interval. Deserialization checks it too.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "RawSpecifications")]
pub struct DeviceSpecifications {
    default_snapshot: DiagnosticsSnapshot,
}

#[derive(Deserialize)]
struct RawSpecifications {
    #[serde(default)]
    default_snapshot: DiagnosticsSnapshot,
}

impl TryFrom<RawSpecifications> for DeviceSpecifications {
    type Error = BoundsViolation;

    fn try_from(raw: RawSpecifications) -> Result<Self, Self::Error> {
        Self::new(raw.default_snapshot)
    }
}

impl DeviceSpecifications {
    /// Fails with the first out-of-range field of `default_snapshot`.
    pub fn new(default_snapshot: DiagnosticsSnapshot) -> Result<Self, BoundsViolation> {
        match default_snapshot.check_bounds().first() {
            Some(violation) => Err(*violation),
            None => Ok(Self { default_snapshot }),
        }
    }

    pub fn create_diagnostics_snapshot(&self) -> DiagnosticsSnapshot {
        self.default_snapshot
    }

    pub fn default_snapshot(&self) -> &DiagnosticsSnapshot {
        &self.default_snapshot
    }
}
