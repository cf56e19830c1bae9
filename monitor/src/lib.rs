//! sysmon library
//!
//! A resident host monitor: samples CPU, memory, disk, network, temperature
//! and battery readings on a fixed cadence, checks them against configured
//! ceilings, and appends one JSON record per tick to a size-rotated log file.
//! SIGINT and SIGTERM stop the loop after the current tick.

pub mod config;
pub mod error;
pub mod host;
pub mod monitor;
pub mod record;
pub mod shutdown;
pub mod sink;
pub mod snapshot;
pub mod source;
pub mod thresholds;

// Re-export commonly used types
pub use config::{LogConfig, MonitorConfig, Overrides, SamplingConfig, ThresholdConfig};
pub use error::{CaptureError, ConfigError, MonitorError, Result, SinkError};
pub use monitor::{sample, Monitor, MonitorState, MonitorStats};
pub use record::{Level, LogRecord, Message};
pub use shutdown::{install_signal_handlers, RunState};
pub use sink::{RecordSink, RotatingLogSink, RotationPolicy};
pub use snapshot::MetricSnapshot;
pub use source::{MetricSource, SysinfoSource};
pub use thresholds::{evaluate, Alert, AlertList};
