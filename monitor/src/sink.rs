//! Record sink with size-based rotation
//!
//! [`RotatingLogSink`] appends one JSON line per record to the active file.
//! Before a write that would push the file past `max_bytes`, the file is
//! rotated to `<path>.1`, older backups shift up by one, and anything beyond
//! `backup_count` is deleted. Rotation problems never stop the write: they are
//! reported on the diagnostic stream and the line goes to the current file.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::config::LogConfig;
use crate::error::{SinkError, SinkResult};
use crate::record::LogRecord;

/// Destination of the record stream
pub trait RecordSink {
    /// Append one record as one unit
    fn append(&mut self, record: &LogRecord) -> SinkResult<()>;

    /// Push buffered data to storage
    fn flush(&mut self) -> SinkResult<()>;
}

impl<T: RecordSink + ?Sized> RecordSink for Box<T> {
    fn append(&mut self, record: &LogRecord) -> SinkResult<()> {
        (**self).append(record)
    }

    fn flush(&mut self) -> SinkResult<()> {
        (**self).flush()
    }
}

/// Size ceiling and retention for rotated files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    pub max_bytes: u64,
    pub backup_count: u32,
}

impl From<&LogConfig> for RotationPolicy {
    fn from(config: &LogConfig) -> Self {
        Self {
            max_bytes: config.max_bytes,
            backup_count: config.backup_count,
        }
    }
}

impl RotationPolicy {
    /// Whether `incoming` more bytes on top of `current` cross the ceiling.
    ///
    /// An empty file is never rotated, so a single record larger than the
    /// ceiling still gets written once instead of rotating forever.
    pub fn should_rotate(&self, current: u64, incoming: u64) -> bool {
        current > 0 && current.saturating_add(incoming) > self.max_bytes
    }
}

/// Append-only JSON-lines file with numbered backups
pub struct RotatingLogSink {
    path: PathBuf,
    policy: RotationPolicy,
    file: File,
    size: u64,
    rotations: u64,
}

impl RotatingLogSink {
    /// Open (or create) the active log file in append mode.
    ///
    /// Missing parent directories are created. Failure here is the one
    /// fatal sink error.
    pub fn open(path: impl AsRef<Path>, policy: RotationPolicy) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let open_err = |e: io::Error| SinkError::Open {
            path: path.display().to_string(),
            reason: e.to_string(),
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(open_err)?;
        }
        let file = open_append(&path).map_err(open_err)?;
        let size = file.metadata().map_err(open_err)?.len();

        tracing::debug!(path = %path.display(), size, "Opened log file");

        Ok(Self {
            path,
            policy,
            file,
            size,
            rotations: 0,
        })
    }

    pub fn from_config(config: &LogConfig) -> SinkResult<Self> {
        Self::open(&config.path, RotationPolicy::from(config))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes in the active file as tracked by the sink
    pub fn current_size(&self) -> u64 {
        self.size
    }

    /// Rotations performed since the sink was opened
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    /// Path of backup number `index` (1 is the most recent)
    pub fn backup_path(&self, index: u32) -> PathBuf {
        backup_path(&self.path, index)
    }

    /// Rotate now, regardless of size
    pub fn rotate(&mut self) -> SinkResult<()> {
        self.file.flush().map_err(rotate_err)?;

        if self.policy.backup_count == 0 {
            File::create(&self.path).map_err(rotate_err)?;
            self.file = open_append(&self.path).map_err(rotate_err)?;
        } else {
            let oldest = self.backup_path(self.policy.backup_count);
            remove_if_exists(&oldest).map_err(rotate_err)?;

            for index in (1..self.policy.backup_count).rev() {
                let from = self.backup_path(index);
                if from.exists() {
                    fs::rename(&from, self.backup_path(index + 1)).map_err(rotate_err)?;
                }
            }
            fs::rename(&self.path, self.backup_path(1)).map_err(rotate_err)?;
            self.file = open_append(&self.path).map_err(rotate_err)?;
        }

        self.size = 0;
        self.rotations += 1;
        tracing::debug!(path = %self.path.display(), rotations = self.rotations, "Rotated log file");
        Ok(())
    }
}

impl RecordSink for RotatingLogSink {
    fn append(&mut self, record: &LogRecord) -> SinkResult<()> {
        let line = record.to_line()?;
        let incoming = line.len() as u64;

        if self.policy.should_rotate(self.size, incoming) {
            if let Err(e) = self.rotate() {
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Log rotation failed, writing to current file"
                );
            }
        }

        self.file
            .write_all(line.as_bytes())
            .map_err(|e| SinkError::Write { reason: e.to_string() })?;
        self.size += incoming;
        self.file.flush().map_err(|e| SinkError::Write { reason: e.to_string() })
    }

    fn flush(&mut self) -> SinkResult<()> {
        self.file.flush().map_err(|e| SinkError::Write { reason: e.to_string() })?;
        self.file.sync_data().map_err(|e| SinkError::Write { reason: e.to_string() })
    }
}

impl Drop for RotatingLogSink {
    fn drop(&mut self) {
        if let Err(e) = RecordSink::flush(self) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to flush log file on close");
        }
    }
}

/// Path of backup number `index` next to `path`
pub fn backup_path(path: &Path, index: u32) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(format!(".{index}"));
    PathBuf::from(name)
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn rotate_err(e: io::Error) -> SinkError {
    SinkError::Rotate { reason: e.to_string() }
}
