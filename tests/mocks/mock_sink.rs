use std::sync::{Arc, Mutex};

use sysmon::error::{SinkError, SinkResult};
use sysmon::{LogRecord, RecordSink};

/// Record sink that keeps everything in memory.
///
/// Clones share storage, so a test can keep one handle while the monitor
/// owns another.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<LogRecord>>>,
    lines: Arc<Mutex<Vec<String>>>,
    flushes: Arc<Mutex<u64>>,
    fail_writes: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink whose every append fails
    pub fn failing() -> Self {
        Self {
            fail_writes: true,
            ..Self::default()
        }
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Serialized lines exactly as a file sink would write them
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn flushes(&self) -> u64 {
        *self.flushes.lock().unwrap()
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &LogRecord) -> SinkResult<()> {
        if self.fail_writes {
            return Err(SinkError::Write { reason: "mock sink rejects writes".to_string() });
        }

        let line = record.to_line()?;
        self.lines.lock().unwrap().push(line);
        self.records.lock().unwrap().push(record.clone());
        Ok(())
    }

    fn flush(&mut self) -> SinkResult<()> {
        *self.flushes.lock().unwrap() += 1;
        Ok(())
    }
}
