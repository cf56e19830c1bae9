//! sysmon entry point
//!
//! Runs the monitor daemon by default. `check` takes a single sample and
//! `config` inspects the effective configuration.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use sysmon::{
    install_signal_handlers, sample, Monitor, MonitorConfig, MonitorError, MonitorStats, Overrides,
    RotatingLogSink, RunState, SysinfoSource,
};

/// Exit code of `check` when at least one threshold was exceeded
const EXIT_ALERT: i32 = 2;

/// sysmon command line interface
#[derive(Parser)]
#[command(name = "sysmon")]
#[command(about = "Resident system resource monitor with threshold alerts")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Record log file path
    #[arg(short, long)]
    log_path: Option<PathBuf>,

    /// Seconds between samples
    #[arg(short, long)]
    interval: Option<u64>,

    /// CPU usage ceiling in percent
    #[arg(long)]
    cpu_threshold: Option<f64>,

    /// Memory usage ceiling in percent
    #[arg(long)]
    mem_threshold: Option<f64>,

    /// Disk usage ceiling in percent
    #[arg(long)]
    disk_threshold: Option<f64>,

    /// Temperature ceiling in degrees Celsius
    #[arg(long)]
    temp_threshold: Option<f64>,

    /// Log file size that triggers rotation
    #[arg(long)]
    max_bytes: Option<u64>,

    /// Number of rotated log files to keep
    #[arg(long)]
    backup_count: Option<u32>,

    /// Diagnostic log level
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit diagnostics as JSON
    #[arg(long)]
    json_logs: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run the monitor until SIGINT or SIGTERM
    Run,

    /// Take one sample and print its record
    Check,

    /// Validate configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Write effective configuration to a TOML file
        #[arg(long)]
        save: Option<PathBuf>,
    },
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            log_path: self.log_path.clone(),
            interval_secs: self.interval,
            cpu_threshold: self.cpu_threshold,
            mem_threshold: self.mem_threshold,
            disk_threshold: self.disk_threshold,
            temp_threshold: self.temp_threshold,
            max_bytes: self.max_bytes,
            backup_count: self.backup_count,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(e) = initialize_logging(&cli) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    match execute(&cli).await {
        Ok(code) => process::exit(code),
        Err(e) if e.is_fatal() => {
            eprintln!("sysmon: startup failed: {}", e);
            process::exit(1);
        }
        Err(e) => {
            eprintln!("sysmon: {} error: {}", e.category(), e);
            process::exit(1);
        }
    }
}

/// Load the configuration and dispatch the command, returning the exit code
async fn execute(cli: &Cli) -> sysmon::Result<i32> {
    let config = MonitorConfig::load(cli.config.as_deref(), &cli.overrides())?;

    match &cli.command {
        Some(Commands::Run) | None => run_monitor(config).await.map(|_| 0),
        Some(Commands::Check) => check(config).await,
        Some(Commands::Config { show, save }) => handle_config(&config, *show, save.as_deref()),
    }
}

/// Initialize diagnostic logging on stderr
fn initialize_logging(cli: &Cli) -> anyhow::Result<()> {
    let log_level = match cli.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(format!("sysmon={}", log_level).parse()?)
        .add_directive("tokio=warn".parse()?);

    if cli.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
            .try_init()?;
    }

    Ok(())
}

/// Run the monitor loop on a blocking thread until a signal arrives
async fn run_monitor(config: MonitorConfig) -> sysmon::Result<MonitorStats> {
    let run_state = RunState::new();
    let signals = install_signal_handlers(run_state.clone())?;

    let sink = match RotatingLogSink::from_config(&config.log) {
        Ok(sink) => sink,
        Err(e) => {
            signals.abort();
            return Err(e.into());
        }
    };
    info!(path = %sink.path().display(), "Writing records");

    let source = SysinfoSource::new(&config.sampling);
    let mut monitor = Monitor::new(source, sink, &config);
    let stats = tokio::task::spawn_blocking(move || monitor.run(&run_state))
        .await
        .map_err(|e| MonitorError::from(format!("Monitor thread panicked: {e}")))?;

    signals.abort();
    Ok(stats)
}

/// Print one record line; the exit code reflects the outcome
async fn check(config: MonitorConfig) -> sysmon::Result<i32> {
    let record = tokio::task::spawn_blocking(move || {
        let mut source = SysinfoSource::new(&config.sampling);
        sample(&mut source, &config.thresholds)
    })
    .await
    .map_err(|e| MonitorError::from(format!("Sampling thread panicked: {e}")))?;

    print!("{}", record.to_line()?);

    let code = match record.level {
        sysmon::Level::Info => 0,
        sysmon::Level::Warning => EXIT_ALERT,
        sysmon::Level::Error => 1,
    };
    Ok(code)
}

/// Handle configuration commands
fn handle_config(config: &MonitorConfig, show: bool, save: Option<&Path>) -> sysmon::Result<i32> {
    if let Some(path) = save {
        config.save_to_file(path)?;
        info!(path = %path.display(), "Saved configuration");
    }

    if show {
        println!("{}", config.to_toml()?);
    } else {
        println!("Configuration is valid");
    }
    Ok(0)
}
