//! Log rotation bounds under a running monitor

use std::fs;
use std::time::Duration;

use sysmon::config::{LogConfig, MonitorConfig};
use sysmon::record::{Level, LogRecord};
use sysmon::sink::{RecordSink, RotatingLogSink, RotationPolicy};
use sysmon::{Monitor, RunState};
use sysmon_tests::{read_records, test_setup, ScriptedSource, SnapshotBuilder, Step, TestLogDir};

fn tick_line_len() -> u64 {
    let record = LogRecord::metrics(chrono::Utc::now(), SnapshotBuilder::new().build(), Vec::new());
    record.to_line().map(|line| line.len() as u64).unwrap_or(0)
}

#[test]
fn test_long_run_stays_within_backup_count() -> anyhow::Result<()> {
    test_setup!();

    let dir = TestLogDir::new()?;
    let log = LogConfig {
        path: dir.log_path(),
        max_bytes: tick_line_len() * 3,
        backup_count: 2,
    };
    let config = MonitorConfig { log: log.clone(), ..MonitorConfig::default() };

    let run_state = RunState::new();
    let steps: Vec<Step> = (0..40).map(|_| SnapshotBuilder::new().build().into()).collect();
    let source = ScriptedSource::new(steps, SnapshotBuilder::new().build()).stop_when_done(run_state.clone());
    let sink = RotatingLogSink::from_config(&config.log)?;

    let mut monitor = Monitor::new(source, sink, &config).with_timing(Duration::from_millis(1), Duration::from_millis(1));
    let stats = monitor.run(&run_state);
    let sink = monitor.into_sink();

    assert_eq!(stats.ticks, 40);
    assert!(sink.rotations() > 2);

    let files = dir.log_files();
    assert_eq!(files.len(), 3, "{files:?}");
    assert!(!dir.backup(3).exists());

    for file in &files {
        let size = fs::metadata(file)?.len();
        assert!(size <= log.max_bytes, "{} is {} bytes", file.display(), size);
    }

    // The newest record is the shutdown notice in the active file
    let active = read_records(&dir.log_path());
    assert_eq!(active.last().map(|r| r["message"].clone()), Some("Shutting down monitor".into()));

    Ok(())
}

#[test]
fn test_backups_hold_older_records() -> anyhow::Result<()> {
    test_setup!();

    let dir = TestLogDir::new()?;
    let time = chrono::Utc::now();
    let line_len = LogRecord::text(time, Level::Info, "entry 00").to_line()?.len() as u64;
    let mut sink = RotatingLogSink::open(dir.log_path(), RotationPolicy { max_bytes: line_len, backup_count: 3 })?;

    for n in 0..4 {
        sink.append(&LogRecord::text(time, Level::Info, format!("entry {n:02}")))?;
    }

    // One record per file; the highest suffix is the oldest
    for (index, expected) in [(3, "entry 00"), (2, "entry 01"), (1, "entry 02")] {
        let records = read_records(&dir.backup(index));
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["message"], expected);
    }
    assert_eq!(read_records(&dir.log_path())[0]["message"], "entry 03");

    Ok(())
}

#[test]
fn test_reopen_appends_and_rotates_existing_content() -> anyhow::Result<()> {
    test_setup!();

    let dir = TestLogDir::new()?;
    let time = chrono::Utc::now();
    let record = LogRecord::startup(time);
    let line_len = record.to_line()?.len() as u64;
    let policy = RotationPolicy { max_bytes: line_len * 2, backup_count: 1 };

    {
        let mut sink = RotatingLogSink::open(dir.log_path(), policy)?;
        sink.append(&record)?;
        sink.append(&record)?;
    }

    // A restarted process picks up the size of the existing file
    let mut sink = RotatingLogSink::open(dir.log_path(), policy)?;
    assert_eq!(sink.current_size(), line_len * 2);
    sink.append(&record)?;

    assert_eq!(sink.rotations(), 1);
    assert_eq!(read_records(&dir.backup(1)).len(), 2);
    assert_eq!(read_records(&dir.log_path()).len(), 1);

    Ok(())
}
