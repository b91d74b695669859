//! Read-only views of a [`HudSnapshot`] for text and JSON consumers.

use crate::device::HudMode;
use crate::simulation::HudSnapshot;
use core::fmt;
use serde::{Deserialize, Serialize};

/// One overlay text; bare lines such as `OFFLINE` carry no label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadoutLine {
    pub label: Option<&'static str>,
    pub value: String,
}

impl fmt::Display for ReadoutLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.label {
            Some(label) => write!(f, "{}: {}", label, self.value),
            None => f.write_str(&self.value),
        }
    }
}

/// The HUD text overlay: mode header, mode overlay and one line per diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudReadout {
    lines: Vec<ReadoutLine>,
}

impl HudReadout {
    pub fn from_snapshot(snapshot: &HudSnapshot) -> Self {
        if !snapshot.is_powered {
            return Self {
                lines: vec![bare("OFFLINE")],
            };
        }

        let d = &snapshot.diagnostics;
        let mut lines = vec![line("MODE", snapshot.mode.label().to_uppercase())];
        match snapshot.mode {
            HudMode::Navigation => lines.push(line("DEST", "400m".to_string())),
            HudMode::Analysis => lines.push(bare("SEARCHING...")),
            HudMode::System => {}
        }
        lines.extend([
            line("CPU", format!("{:.0}%", d.cpu_load.round())),
            line(
                "MEM",
                format!("{:.1}TB / {:.0}TB", d.memory_usage, d.memory_capacity),
            ),
            line(
                "NET",
                format!(
                    "{} {:.0}%",
                    d.network_connection.label(),
                    (d.network_strength * 100.0).round()
                ),
            ),
            line("TEMP", format!("{:.1}°C", d.temperature_c)),
            line(
                "WIND",
                format!("{:.0}km/h {}", d.wind_speed_kmh, d.wind_direction.label()),
            ),
            line("HUM", format!("{:.0}%", d.humidity_percent)),
        ]);

        Self { lines }
    }

    pub fn lines(&self) -> &[ReadoutLine] {
        &self.lines
    }
}

impl fmt::Display for HudReadout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, line) in self.lines.iter().enumerate() {
            if index > 0 {
                f.write_str(" | ")?;
            }
            write!(f, "{line}")?;
        }
        Ok(())
    }
}

fn line(label: &'static str, value: String) -> ReadoutLine {
    ReadoutLine {
        label: Some(label),
        value,
    }
}

fn bare(value: &str) -> ReadoutLine {
    ReadoutLine {
        label: None,
        value: value.to_string(),
    }
}

/// One published snapshot stamped for export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    pub sequence: u64,
    pub timestamp_ms: f64,
    pub snapshot: HudSnapshot,
}

impl TelemetryFrame {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Emits every `every_frames`-th snapshot, plus any forced one.
#[derive(Debug)]
pub struct TelemetrySampler {
    every_frames: u32,
    frames_since_emit: u32,
    next_sequence: u64,
}

impl TelemetrySampler {
    pub fn new(every_frames: u32) -> Self {
        Self {
            every_frames: every_frames.max(1),
            frames_since_emit: 0,
            next_sequence: 1,
        }
    }

    pub fn sample(
        &mut self,
        snapshot: &HudSnapshot,
        timestamp_ms: f64,
        force: bool,
    ) -> Option<TelemetryFrame> {
        self.frames_since_emit += 1;
        if !force && self.frames_since_emit < self.every_frames {
            return None;
        }

        self.frames_since_emit = 0;
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        Some(TelemetryFrame {
            sequence,
            timestamp_ms,
            snapshot: snapshot.clone(),
        })
    }
}
