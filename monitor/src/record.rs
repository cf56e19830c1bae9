//! Log records
//!
//! One [`LogRecord`] becomes exactly one line in the log file:
//!
//! ```text
//! {"time":"2024-01-01T00:00:00Z","level":"WARNING","message":{"metrics":{...},"alerts":["High CPU usage: 95%"]}}
//! ```

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::snapshot::MetricSnapshot;
use crate::thresholds::AlertList;

/// Format of the `time` field: UTC, second precision, literal `Z`
pub const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub const STARTUP_MESSAGE: &str = "Starting system monitor";
pub const SHUTDOWN_MESSAGE: &str = "Shutting down monitor";

/// Record severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Level {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Level::Info => write!(f, "INFO"),
            Level::Warning => write!(f, "WARNING"),
            Level::Error => write!(f, "ERROR"),
        }
    }
}

/// Record payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Message {
    /// A sampled tick
    Metrics { metrics: MetricSnapshot, alerts: AlertList },

    /// Lifecycle notices and capture diagnostics
    Text(String),
}

/// The persisted unit of the record stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogRecord {
    #[serde(serialize_with = "serialize_time")]
    pub time: DateTime<Utc>,
    pub level: Level,
    pub message: Message,
}

impl LogRecord {
    /// Record for a successful tick: WARNING when any alert fired, INFO otherwise
    pub fn metrics(time: DateTime<Utc>, metrics: MetricSnapshot, alerts: AlertList) -> Self {
        let level = if alerts.is_empty() { Level::Info } else { Level::Warning };
        Self {
            time,
            level,
            message: Message::Metrics { metrics, alerts },
        }
    }

    /// Record for a tick whose capture failed. Carries no metrics.
    pub fn capture_failed(time: DateTime<Utc>, reason: impl fmt::Display) -> Self {
        Self::text(time, Level::Error, format!("Metrics collection failed: {reason}"))
    }

    pub fn startup(time: DateTime<Utc>) -> Self {
        Self::text(time, Level::Info, STARTUP_MESSAGE)
    }

    pub fn shutdown(time: DateTime<Utc>) -> Self {
        Self::text(time, Level::Info, SHUTDOWN_MESSAGE)
    }

    pub fn text(time: DateTime<Utc>, level: Level, message: impl Into<String>) -> Self {
        Self {
            time,
            level,
            message: Message::Text(message.into()),
        }
    }

    /// Alerts carried by this record, empty for text records
    pub fn alerts(&self) -> &[String] {
        match &self.message {
            Message::Metrics { alerts, .. } => alerts,
            Message::Text(_) => &[],
        }
    }

    /// Render as a single newline-terminated JSON line.
    ///
    /// serde_json escapes control characters inside strings, so the only
    /// newline in the output is the terminator.
    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

fn serialize_time<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&time.format(TIME_FORMAT))
}
