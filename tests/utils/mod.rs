//! Fixture builders and log file helpers

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde_json::Value;
use tempfile::TempDir;

use sysmon::snapshot::{BatteryStatus, CpuMetrics, DiskMetrics, MemoryMetrics, MetricSnapshot, NetworkMetrics};

/// Builder for snapshots of an idle, healthy host
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    snapshot: MetricSnapshot,
}

impl Default for SnapshotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self {
            snapshot: MetricSnapshot {
                timestamp: Utc::now(),
                cpu: CpuMetrics {
                    total: 12.5,
                    per_core: vec![10.0, 15.0, 12.0, 13.0],
                    load_avg: [25.0, 20.0, 15.0],
                },
                memory: MemoryMetrics {
                    total: 16 << 30,
                    available: 12 << 30,
                    used: 4 << 30,
                    percent: 25.0,
                    swap_used: 0,
                    swap_percent: 0.0,
                },
                disk: DiskMetrics {
                    total: 500 << 30,
                    used: 200 << 30,
                    free: 300 << 30,
                    percent: 40.0,
                    read_bytes: 1 << 30,
                    write_bytes: 2 << 30,
                },
                network: NetworkMetrics { bytes_sent: 1_000_000, bytes_recv: 5_000_000 },
                temperatures: BTreeMap::new(),
                battery: None,
            },
        }
    }

    pub fn cpu(mut self, total: f64) -> Self {
        self.snapshot.cpu.total = total;
        self
    }

    pub fn per_core(mut self, cores: &[f64]) -> Self {
        self.snapshot.cpu.per_core = cores.to_vec();
        self
    }

    pub fn memory(mut self, percent: f64) -> Self {
        self.snapshot.memory.percent = percent;
        self
    }

    pub fn disk(mut self, percent: f64) -> Self {
        self.snapshot.disk.percent = percent;
        self
    }

    pub fn temperature(mut self, sensor: &str, celsius: f64) -> Self {
        self.snapshot.temperatures.insert(sensor.to_string(), celsius);
        self
    }

    pub fn battery(mut self, percent: f64, power_plugged: bool) -> Self {
        self.snapshot.battery = Some(BatteryStatus { percent, power_plugged });
        self
    }

    pub fn build(self) -> MetricSnapshot {
        self.snapshot
    }
}

/// Temporary directory holding a log file and its backups
pub struct TestLogDir {
    dir: TempDir,
}

impl TestLogDir {
    pub fn new() -> anyhow::Result<Self> {
        Ok(Self { dir: TempDir::new()? })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Active log file path
    pub fn log_path(&self) -> PathBuf {
        self.dir.path().join("system_monitor.log")
    }

    /// Backup `index` of the active log file
    pub fn backup(&self, index: u32) -> PathBuf {
        sysmon::sink::backup_path(&self.log_path(), index)
    }

    /// Every file in the directory that belongs to the log
    pub fn log_files(&self) -> Vec<PathBuf> {
        let mut files: Vec<PathBuf> = fs::read_dir(self.dir.path())
            .map(|entries| entries.filter_map(|e| e.ok()).map(|e| e.path()).collect())
            .unwrap_or_default();
        files.retain(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("system_monitor.log"))
        });
        files.sort();
        files
    }
}

/// Parse every line of a log file as JSON. Panics on a malformed line.
pub fn read_records(path: &Path) -> Vec<Value> {
    fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("malformed line {line:?}: {e}")))
        .collect()
}
