#![forbid(unsafe_code)]

//! `sockline` — Unix domain socket line exchange demonstration.
//!
//! Starts the listener, the connector, or both, against one socket path.
//! The listener sends lines typed on stdin; the connector prints them and
//! acknowledges each. Typing an empty line ends the session.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use sockline::console::{StdinSource, StdoutSink};
use sockline::mode::RunMode;
use sockline::{runner, AppError, Result, SessionConfig};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sockline", about = "Unix domain socket line exchange", version, long_about = None)]
struct Cli {
    /// Endpoints to run: `s` (listener), `c` (connector) or `sc` (both).
    #[arg(default_value_t = RunMode::Both)]
    mode: RunMode,

    /// Socket path. Defaults to a fresh temporary file.
    path: Option<PathBuf>,

    /// Path to an optional TOML configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|err| AppError::Config(format!("failed to build tokio runtime: {err}")))?
        .block_on(run(args))
}

async fn run(args: Cli) -> Result<()> {
    let config = match &args.config {
        Some(path) => SessionConfig::load_from_path(path)?,
        None => SessionConfig::default(),
    };
    let path = match args.path {
        Some(path) => path,
        None => temp_socket_path()?,
    };
    info!(mode = %args.mode, path = %path.display(), "sockline starting");

    let report = runner::run(
        args.mode,
        path,
        Arc::new(config),
        StdinSource::new(),
        StdoutSink::new(),
    )
    .await;

    info!(
        listener_ok = report.listener.as_ref().map(std::result::Result::is_ok),
        connector_ok = report.connector.as_ref().map(std::result::Result::is_ok),
        "sockline finished"
    );
    report.into_result()
}

/// Create an empty temporary file and keep it; the listener replaces it.
fn temp_socket_path() -> Result<PathBuf> {
    tempfile::Builder::new()
        .prefix("sockline-")
        .suffix(".sock")
        .tempfile()
        .map_err(|err| AppError::Io(format!("failed to create temporary path: {err}")))?
        .into_temp_path()
        .keep()
        .map_err(|err| AppError::Io(format!("failed to keep temporary path: {err}")))
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
