//! Metric source adapter
//!
//! [`MetricSource`] is the seam between the monitor loop and the host. The
//! production implementation, [`SysinfoSource`], reads CPU, memory, network
//! and sensor data through `sysinfo` and the rest through [`crate::host`].

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use sysinfo::{Components, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};

use crate::config::SamplingConfig;
use crate::error::{CaptureError, CaptureResult};
use crate::host;
use crate::snapshot::{
    normalize_load, percent_of, round_tenth, CpuMetrics, DiskMetrics, MemoryMetrics, MetricSnapshot,
    NetworkMetrics,
};

/// Something that can produce a snapshot of the host on demand.
///
/// Implementations may block for a short, bounded time (CPU utilisation is
/// measured over a window). Only mandatory readings may fail; optional ones
/// resolve to empty or absent values.
pub trait MetricSource {
    fn capture(&mut self) -> CaptureResult<MetricSnapshot>;
}

impl<T: MetricSource + ?Sized> MetricSource for Box<T> {
    fn capture(&mut self) -> CaptureResult<MetricSnapshot> {
        (**self).capture()
    }
}

/// Reads the running host
pub struct SysinfoSource {
    system: System,
    networks: Networks,
    components: Components,
    cpu_window: Duration,
    disk_path: PathBuf,
}

impl SysinfoSource {
    pub fn new(config: &SamplingConfig) -> Self {
        let mut system = System::new();
        system.refresh_cpu();
        system.refresh_memory();

        Self {
            system,
            networks: Networks::new_with_refreshed_list(),
            components: Components::new_with_refreshed_list(),
            cpu_window: config.cpu_sample_window().max(MINIMUM_CPU_UPDATE_INTERVAL),
            disk_path: config.disk_path.clone(),
        }
    }

    fn capture_cpu(&mut self) -> CaptureResult<CpuMetrics> {
        self.system.refresh_cpu();
        thread::sleep(self.cpu_window);
        self.system.refresh_cpu();

        let cores = self.system.cpus();
        if cores.is_empty() {
            return Err(CaptureError::Cpu { reason: "no logical cores reported".to_string() });
        }

        let per_core = cores
            .iter()
            .map(|cpu| round_tenth(f64::from(cpu.cpu_usage())))
            .collect();
        let load = System::load_average();

        Ok(CpuMetrics {
            total: round_tenth(f64::from(self.system.global_cpu_info().cpu_usage())),
            per_core,
            load_avg: normalize_load([load.one, load.five, load.fifteen], cores.len()),
        })
    }

    fn capture_memory(&mut self) -> CaptureResult<MemoryMetrics> {
        self.system.refresh_memory();

        let total = self.system.total_memory();
        if total == 0 {
            return Err(CaptureError::Memory { reason: "total memory reported as zero".to_string() });
        }
        let available = self.system.available_memory();
        let swap_total = self.system.total_swap();
        let swap_used = self.system.used_swap();

        Ok(MemoryMetrics {
            total,
            available,
            used: self.system.used_memory().min(total),
            percent: percent_of(total.saturating_sub(available), total),
            swap_used,
            swap_percent: percent_of(swap_used, swap_total),
        })
    }

    fn capture_disk(&self) -> CaptureResult<DiskMetrics> {
        let usage = host::filesystem_usage(&self.disk_path)?;
        let io = host::disk_io()?;

        Ok(DiskMetrics {
            total: usage.total,
            used: usage.used,
            free: usage.free,
            percent: usage.percent,
            read_bytes: io.read_bytes,
            write_bytes: io.write_bytes,
        })
    }

    fn capture_network(&mut self) -> CaptureResult<NetworkMetrics> {
        self.networks.refresh_list();
        if self.networks.is_empty() {
            return Err(CaptureError::Network { reason: "no network interfaces reported".to_string() });
        }

        let (bytes_sent, bytes_recv) = self.networks.iter().fold((0u64, 0u64), |(sent, recv), (_, data)| {
            (
                sent.saturating_add(data.total_transmitted()),
                recv.saturating_add(data.total_received()),
            )
        });

        Ok(NetworkMetrics { bytes_sent, bytes_recv })
    }

    fn capture_temperatures(&mut self) -> BTreeMap<String, f64> {
        self.components.refresh();
        sensor_map(
            self.components
                .iter()
                .map(|component| (component.label().to_string(), component.temperature())),
        )
    }
}

impl MetricSource for SysinfoSource {
    fn capture(&mut self) -> CaptureResult<MetricSnapshot> {
        let cpu = self.capture_cpu()?;
        let memory = self.capture_memory()?;
        let disk = self.capture_disk()?;
        let network = self.capture_network()?;

        Ok(MetricSnapshot {
            timestamp: Utc::now(),
            cpu,
            memory,
            disk,
            network,
            temperatures: self.capture_temperatures(),
            battery: host::battery(),
        })
    }
}

/// Collect sensor readings, dropping non-finite values.
///
/// Hosts can expose several sensors under one label (one `Core 0` per
/// package, say); later duplicates become `label#2`, `label#3` and so on.
pub fn sensor_map(readings: impl IntoIterator<Item = (String, f32)>) -> BTreeMap<String, f64> {
    let mut sensors = BTreeMap::new();

    for (label, celsius) in readings {
        if !celsius.is_finite() {
            continue;
        }
        let label = if label.is_empty() { "sensor".to_string() } else { label };

        let mut key = label.clone();
        let mut n = 1;
        while sensors.contains_key(&key) {
            n += 1;
            key = format!("{label}#{n}");
        }
        sensors.insert(key, round_tenth(f64::from(celsius)));
    }

    sensors
}
