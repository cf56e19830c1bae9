//! Error handling for the sysmon daemon
//!
//! This module provides the error types for every monitor operation:
//! metric capture, record sink I/O and rotation, and configuration loading.

use std::io;

use thiserror::Error;

/// The main error type for the monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Record sink errors
    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),

    /// Configuration related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Generic(String),
}

/// Failures of the mandatory host readings.
///
/// Optional readings (temperatures, battery) never produce one of these; they
/// resolve to empty or absent data instead.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("CPU reading failed: {reason}")]
    Cpu { reason: String },

    #[error("Memory reading failed: {reason}")]
    Memory { reason: String },

    #[error("Disk reading failed: {reason}")]
    Disk { reason: String },

    #[error("Network reading failed: {reason}")]
    Network { reason: String },
}

/// Record sink errors
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Cannot open log file {path}: {reason}")]
    Open { path: String, reason: String },

    #[error("Log write failed: {reason}")]
    Write { reason: String },

    #[error("Log rotation failed: {reason}")]
    Rotate { reason: String },

    #[error("Record serialization failed: {reason}")]
    Serialize { reason: String },
}

/// Configuration related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Configuration parsing error: {reason}")]
    ParseError { reason: String },

    #[error("Invalid configuration value: {field} = {value}")]
    InvalidValue { field: String, value: String },

    #[error("Configuration validation failed: {reason}")]
    ValidationFailed { reason: String },

    #[error("Configuration file permission denied: {path}")]
    PermissionDenied { path: String },
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, MonitorError>;

/// A specialized result type for metric capture
pub type CaptureResult<T> = std::result::Result<T, CaptureError>;

/// A specialized result type for record sink operations
pub type SinkResult<T> = std::result::Result<T, SinkError>;

/// A specialized result type for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl MonitorError {
    /// Whether the process must exit instead of carrying on.
    ///
    /// Only startup failures are fatal: an unopenable log file or an invalid
    /// configuration. Everything that can happen inside a tick is recovered.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            MonitorError::Sink(SinkError::Open { .. }) | MonitorError::Config(_)
        )
    }

    /// Get the error category for diagnostics
    pub fn category(&self) -> &'static str {
        match self {
            MonitorError::Sink(_) => "sink",
            MonitorError::Config(_) => "config",
            MonitorError::Io(_) => "io",
            MonitorError::Serialization(_) => "serialization",
            MonitorError::Generic(_) => "generic",
        }
    }
}

impl From<String> for MonitorError {
    fn from(msg: String) -> Self {
        MonitorError::Generic(msg)
    }
}

impl From<serde_json::Error> for SinkError {
    fn from(err: serde_json::Error) -> Self {
        SinkError::Serialize { reason: err.to_string() }
    }
}
