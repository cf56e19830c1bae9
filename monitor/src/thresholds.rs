//! Threshold evaluation
//!
//! Maps a snapshot and the configured ceilings to human-readable alerts.
//! Every dimension is checked independently; a tick can raise several alerts.

use std::fmt;

use crate::config::ThresholdConfig;
use crate::snapshot::MetricSnapshot;

/// Alerts raised by one tick, in evaluation order
pub type AlertList = Vec<String>;

/// A single exceeded ceiling
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Cpu(f64),
    Memory(f64),
    Disk(f64),
    Temperature { sensor: String, celsius: f64 },
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu(value) => write!(f, "High CPU usage: {value}%"),
            Self::Memory(value) => write!(f, "High memory usage: {value}%"),
            Self::Disk(value) => write!(f, "High disk usage: {value}%"),
            Self::Temperature { sensor, celsius } => {
                write!(f, "High temperature ({sensor}): {celsius}°C")
            }
        }
    }
}

/// Check a snapshot against the ceilings.
///
/// Comparisons are strict: a value equal to its ceiling does not alert.
/// Values are reported exactly as captured. Order is CPU, memory, disk, then
/// one entry per offending sensor in the snapshot's sensor order.
pub fn evaluate(snapshot: &MetricSnapshot, thresholds: &ThresholdConfig) -> AlertList {
    exceeded(snapshot, thresholds)
        .iter()
        .map(Alert::to_string)
        .collect()
}

/// Same as [`evaluate`] but keeps the structured form.
pub fn exceeded(snapshot: &MetricSnapshot, thresholds: &ThresholdConfig) -> Vec<Alert> {
    let mut alerts = Vec::new();

    if snapshot.cpu.total > thresholds.cpu {
        alerts.push(Alert::Cpu(snapshot.cpu.total));
    }
    if snapshot.memory.percent > thresholds.memory {
        alerts.push(Alert::Memory(snapshot.memory.percent));
    }
    if snapshot.disk.percent > thresholds.disk {
        alerts.push(Alert::Disk(snapshot.disk.percent));
    }
    for (sensor, &celsius) in &snapshot.temperatures {
        if celsius > thresholds.temperature {
            alerts.push(Alert::Temperature { sensor: sensor.clone(), celsius });
        }
    }

    alerts
}
