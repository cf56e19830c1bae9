//! Monitor loop
//!
//! Owns the sampling cadence and the shutdown state machine:
//!
//! ```text
//! Starting -> Running -> Stopping -> Stopped
//! ```
//!
//! Each tick captures a snapshot, evaluates it against the thresholds and
//! appends one record. Between ticks the loop sleeps in short slices so a
//! cleared [`RunState`] is noticed within one slice. A tick that has started
//! always completes before the loop exits.

use std::thread;
use std::time::{Duration, Instant};

use chrono::Utc;

use crate::config::{MonitorConfig, ThresholdConfig};
use crate::record::{LogRecord, Message};
use crate::shutdown::RunState;
use crate::sink::RecordSink;
use crate::source::MetricSource;
use crate::thresholds;

/// Lifecycle of a [`Monitor`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Starting,
    Running,
    Stopping,
    Stopped,
}

/// Counters for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorStats {
    /// Ticks started (successful or not)
    pub ticks: u64,

    /// Ticks whose capture failed
    pub capture_failures: u64,

    /// Ticks that raised at least one alert
    pub alert_ticks: u64,

    /// Records the sink failed to write
    pub sink_failures: u64,
}

/// Capture one snapshot and turn it into a record.
///
/// A failed capture yields an ERROR record without metrics; the evaluator is
/// not consulted for that tick.
pub fn sample<S: MetricSource + ?Sized>(source: &mut S, thresholds: &ThresholdConfig) -> LogRecord {
    match source.capture() {
        Ok(snapshot) => {
            let alerts = thresholds::evaluate(&snapshot, thresholds);
            LogRecord::metrics(Utc::now(), snapshot, alerts)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Metrics collection failed");
            LogRecord::capture_failed(Utc::now(), e)
        }
    }
}

/// The resident sampling loop
pub struct Monitor<S, K> {
    source: S,
    sink: K,
    thresholds: ThresholdConfig,
    interval: Duration,
    slice: Duration,
    state: MonitorState,
    stats: MonitorStats,
}

impl<S: MetricSource, K: RecordSink> Monitor<S, K> {
    pub fn new(source: S, sink: K, config: &MonitorConfig) -> Self {
        Self {
            source,
            sink,
            thresholds: config.thresholds,
            interval: config.sampling.interval(),
            slice: config.sampling.sleep_slice(),
            state: MonitorState::Starting,
            stats: MonitorStats::default(),
        }
    }

    /// Override the cadence. `slice` is clamped to at least one millisecond.
    pub fn with_timing(mut self, interval: Duration, slice: Duration) -> Self {
        self.interval = interval;
        self.slice = slice.max(Duration::from_millis(1));
        self
    }

    pub fn state(&self) -> MonitorState {
        self.state
    }

    pub fn stats(&self) -> MonitorStats {
        self.stats
    }

    pub fn into_sink(self) -> K {
        self.sink
    }

    /// Run until `run_state` is cleared, then write the shutdown record.
    ///
    /// Blocks the calling thread for the whole run.
    pub fn run(&mut self, run_state: &RunState) -> MonitorStats {
        self.write(&LogRecord::startup(Utc::now()));
        self.transition(MonitorState::Running);
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            cpu = self.thresholds.cpu,
            memory = self.thresholds.memory,
            disk = self.thresholds.disk,
            temperature = self.thresholds.temperature,
            "Monitor running"
        );

        while run_state.is_running() {
            self.tick();
            self.pause(run_state);
        }

        self.transition(MonitorState::Stopping);
        self.write(&LogRecord::shutdown(Utc::now()));
        if let Err(e) = self.sink.flush() {
            tracing::error!(error = %e, "Failed to flush log sink");
        }
        self.transition(MonitorState::Stopped);

        tracing::info!(
            ticks = self.stats.ticks,
            capture_failures = self.stats.capture_failures,
            alert_ticks = self.stats.alert_ticks,
            "Monitor stopped"
        );
        self.stats
    }

    /// One capture, evaluate, append cycle
    pub fn tick(&mut self) -> LogRecord {
        self.stats.ticks += 1;

        let record = sample(&mut self.source, &self.thresholds);
        match &record.message {
            Message::Text(_) => self.stats.capture_failures += 1,
            Message::Metrics { alerts, .. } if !alerts.is_empty() => {
                self.stats.alert_ticks += 1;
                tracing::debug!(alerts = alerts.len(), "Thresholds exceeded");
            }
            Message::Metrics { .. } => {}
        }

        self.write(&record);
        record
    }

    /// Sleep for the interval in slices, returning early once stopped.
    ///
    /// An interval too large to add to the clock has no deadline: the loop
    /// sleeps until stopped.
    fn pause(&self, run_state: &RunState) {
        let deadline = Instant::now().checked_add(self.interval);
        while run_state.is_running() {
            let slice = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        break;
                    }
                    self.slice.min(deadline - now)
                }
                None => self.slice,
            };
            thread::sleep(slice);
        }
    }

    fn write(&mut self, record: &LogRecord) {
        if let Err(e) = self.sink.append(record) {
            self.stats.sink_failures += 1;
            tracing::error!(error = %e, level = %record.level, "Failed to write log record");
        }
    }

    fn transition(&mut self, next: MonitorState) {
        tracing::debug!(from = ?self.state, to = ?next, "Monitor state change");
        self.state = next;
    }
}
