//! Point-in-time host metrics
//!
//! A [`MetricSnapshot`] is captured once per tick, never mutated, and dropped
//! after its record has been written.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One capture of every monitored metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    /// Capture instant
    pub timestamp: DateTime<Utc>,

    /// Processor utilisation
    pub cpu: CpuMetrics,

    /// Physical memory and swap
    pub memory: MemoryMetrics,

    /// Root filesystem usage and block I/O counters
    pub disk: DiskMetrics,

    /// Interface byte counters
    pub network: NetworkMetrics,

    /// Sensor label to degrees Celsius; empty when the host exposes no sensors
    pub temperatures: BTreeMap<String, f64>,

    /// Absent when the host has no battery
    pub battery: Option<BatteryStatus>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuMetrics {
    /// Overall utilisation in percent. Multi-core sampling artifacts can push
    /// this slightly above 100; such values are kept as-is.
    pub total: f64,

    /// Utilisation per logical core, in core order
    pub per_core: Vec<f64>,

    /// 1, 5 and 15 minute load averages, each divided by the logical core
    /// count and scaled by 100. This is queue length relative to core count,
    /// not a utilisation percentage, and can exceed 100.
    pub load_avg: [f64; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryMetrics {
    pub total: u64,
    pub available: u64,
    pub used: u64,
    pub percent: f64,
    pub swap_used: u64,
    pub swap_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMetrics {
    pub total: u64,
    pub used: u64,
    pub free: u64,
    pub percent: f64,

    /// Bytes read since boot
    pub read_bytes: u64,

    /// Bytes written since boot
    pub write_bytes: u64,
}

/// Byte counters summed over all interfaces, since boot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkMetrics {
    pub bytes_sent: u64,
    pub bytes_recv: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatteryStatus {
    pub percent: f64,
    pub power_plugged: bool,
}

/// Round a reading to one decimal place.
///
/// Applied once at capture time so the values the evaluator later reports
/// match the values written to the log.
pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// `part / whole` as a rounded percentage, 0 when `whole` is 0.
pub fn percent_of(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    round_tenth(part as f64 / whole as f64 * 100.0)
}

/// Normalise raw load averages by the logical core count.
pub fn normalize_load(load: [f64; 3], cores: usize) -> [f64; 3] {
    if cores == 0 {
        return [0.0; 3];
    }
    load.map(|value| value / cores as f64 * 100.0)
}
