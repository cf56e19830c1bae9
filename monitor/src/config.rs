//! Configuration management for the sysmon daemon
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files, environment variables, and command line overrides.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Main configuration structure for the monitor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Sampling cadence
    pub sampling: SamplingConfig,

    /// Alert ceilings
    pub thresholds: ThresholdConfig,

    /// Record stream destination and rotation
    pub log: LogConfig,
}

/// Sampling cadence configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplingConfig {
    /// Seconds between ticks
    pub interval_secs: u64,

    /// Granularity at which the inter-tick sleep re-checks the run flag
    pub sleep_slice_ms: u64,

    /// Window over which CPU utilisation is measured
    pub cpu_sample_ms: u64,

    /// Filesystem whose usage is reported
    pub disk_path: PathBuf,
}

/// Alert ceilings. A metric strictly above its ceiling raises an alert.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Total CPU percent
    pub cpu: f64,

    /// Memory percent
    pub memory: f64,

    /// Disk percent
    pub disk: f64,

    /// Degrees Celsius, applied to every sensor
    pub temperature: f64,
}

/// Record stream configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Active log file
    pub path: PathBuf,

    /// Size ceiling of the active file before it is rotated
    pub max_bytes: u64,

    /// Number of rotated files kept (`.1` … `.N`)
    pub backup_count: u32,
}

/// Values given on the command line. `None` leaves the layered value alone.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub log_path: Option<PathBuf>,
    pub interval_secs: Option<u64>,
    pub cpu_threshold: Option<f64>,
    pub mem_threshold: Option<f64>,
    pub disk_threshold: Option<f64>,
    pub temp_threshold: Option<f64>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<u32>,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            sleep_slice_ms: 100,
            cpu_sample_ms: 500,
            disk_path: PathBuf::from("/"),
        }
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            cpu: 90.0,
            memory: 85.0,
            disk: 90.0,
            temperature: 80.0,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("/var/log/system_monitor.log"),
            max_bytes: 10 * 1024 * 1024, // 10MB
            backup_count: 5,
        }
    }
}

impl SamplingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn sleep_slice(&self) -> Duration {
        Duration::from_millis(self.sleep_slice_ms)
    }

    pub fn cpu_sample_window(&self) -> Duration {
        Duration::from_millis(self.cpu_sample_ms)
    }
}

impl MonitorConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| read_error(path, e))?;

        let config: MonitorConfig = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError { reason: e.to_string() })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply `SYSMON_*` environment variables on top of this configuration
    pub fn apply_env(mut self) -> ConfigResult<Self> {
        if let Ok(path) = std::env::var("SYSMON_LOG_PATH") {
            self.log.path = PathBuf::from(path);
        }
        if let Some(value) = env_value("SYSMON_INTERVAL")? {
            self.sampling.interval_secs = value;
        }
        if let Some(value) = env_value("SYSMON_CPU_THRESHOLD")? {
            self.thresholds.cpu = value;
        }
        if let Some(value) = env_value("SYSMON_MEM_THRESHOLD")? {
            self.thresholds.memory = value;
        }
        if let Some(value) = env_value("SYSMON_DISK_THRESHOLD")? {
            self.thresholds.disk = value;
        }
        if let Some(value) = env_value("SYSMON_TEMP_THRESHOLD")? {
            self.thresholds.temperature = value;
        }
        if let Some(value) = env_value("SYSMON_MAX_BYTES")? {
            self.log.max_bytes = value;
        }
        if let Some(value) = env_value("SYSMON_BACKUP_COUNT")? {
            self.log.backup_count = value;
        }
        Ok(self)
    }

    /// Apply command line overrides on top of this configuration
    pub fn apply_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(path) = &overrides.log_path {
            self.log.path = path.clone();
        }
        if let Some(interval) = overrides.interval_secs {
            self.sampling.interval_secs = interval;
        }
        if let Some(cpu) = overrides.cpu_threshold {
            self.thresholds.cpu = cpu;
        }
        if let Some(memory) = overrides.mem_threshold {
            self.thresholds.memory = memory;
        }
        if let Some(disk) = overrides.disk_threshold {
            self.thresholds.disk = disk;
        }
        if let Some(temperature) = overrides.temp_threshold {
            self.thresholds.temperature = temperature;
        }
        if let Some(max_bytes) = overrides.max_bytes {
            self.log.max_bytes = max_bytes;
        }
        if let Some(backup_count) = overrides.backup_count {
            self.log.backup_count = backup_count;
        }
        self
    }

    /// Load configuration with precedence: defaults < file < env < overrides
    ///
    /// An explicit `config_path` must exist. Without one, the default location
    /// is used only when a file is present there.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> ConfigResult<Self> {
        let config = match config_path {
            Some(path) => MonitorConfig::from_file(path)?,
            None => match MonitorConfig::default_config_path() {
                Ok(path) if path.exists() => MonitorConfig::from_file(path)?,
                _ => MonitorConfig::default(),
            },
        };

        let config = config.apply_env()?.apply_overrides(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ConfigResult<()> {
        let sampling = &self.sampling;
        if sampling.interval_secs == 0 {
            return Err(invalid("sampling.interval_secs", 0));
        }
        if sampling.sleep_slice_ms == 0 || sampling.sleep_slice() > sampling.interval() {
            return Err(invalid("sampling.sleep_slice_ms", sampling.sleep_slice_ms));
        }
        if sampling.cpu_sample_ms == 0 {
            return Err(invalid("sampling.cpu_sample_ms", 0));
        }

        let percent_ceilings = [
            ("thresholds.cpu", self.thresholds.cpu),
            ("thresholds.memory", self.thresholds.memory),
            ("thresholds.disk", self.thresholds.disk),
        ];
        for (field, value) in percent_ceilings {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(invalid(field, value));
            }
        }
        let temperature = self.thresholds.temperature;
        if !temperature.is_finite() || temperature < 0.0 {
            return Err(invalid("thresholds.temperature", temperature));
        }

        if self.log.path.as_os_str().is_empty() {
            return Err(ConfigError::ValidationFailed {
                reason: "log.path must not be empty".to_string(),
            });
        }
        if self.log.max_bytes == 0 {
            return Err(invalid("log.max_bytes", 0));
        }

        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> ConfigResult<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join("sysmon").join("sysmon.toml"))
            .ok_or_else(|| ConfigError::ValidationFailed {
                reason: "Unable to determine config directory".to_string(),
            })
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|_| ConfigError::ValidationFailed {
                reason: format!("Unable to create config directory: {}", parent.display()),
            })?;
        }

        fs::write(path, self.to_toml()?)
            .map_err(|_| ConfigError::PermissionDenied { path: path.to_string_lossy().to_string() })?;

        Ok(())
    }

    /// Render the configuration as pretty TOML
    pub fn to_toml(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::ValidationFailed { reason: e.to_string() })
    }
}

fn invalid(field: &str, value: impl ToString) -> ConfigError {
    ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    }
}

fn read_error(path: &Path, err: io::Error) -> ConfigError {
    let path_str = path.to_string_lossy().to_string();
    match err.kind() {
        io::ErrorKind::NotFound => ConfigError::FileNotFound { path: path_str },
        io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied { path: path_str },
        _ => ConfigError::ParseError {
            reason: format!("cannot read {}: {}", path_str, err),
        },
    }
}

fn env_value<T: FromStr>(name: &str) -> ConfigResult<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { field: name.to_string(), value: raw }),
        Err(_) => Ok(None),
    }
}
