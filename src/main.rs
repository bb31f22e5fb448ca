//! Interval bars - main entry point
//!
//! Usage: `interval-bars <INSTRUMENT_ID> <INPUT>` writes `Result_<INPUT>` in
//! the working directory.

use anyhow::Result;
use chrono::{DateTime, Utc};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(name = "interval-bars")]
#[command(about = "Append 5/15/30/60 bar aggregates to a minute-bar CSV", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Instrument identifier written into every output row
    pub instrument_id: String,

    /// Input CSV: Date,Open,High,Low,Close,Adj Close,Volume
    pub input: PathBuf,

    /// Output path (default: Result_<input file name>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Use every bar of a window for its high, low and volume, including the
    /// opening bar
    #[arg(long)]
    pub full_window: bool,

    /// Abort on non-numeric price or volume fields instead of skipping the row
    #[arg(long)]
    pub strict: bool,

    /// Write a column header row
    #[arg(long)]
    pub header: bool,

    /// Base instant for synthesized timestamps (RFC 3339), instead of the clock
    #[arg(long)]
    pub base_time: Option<DateTime<Utc>>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

fn setup_logging(verbose: bool, command_name: &str) -> Result<()> {
    // Create logs directory
    std::fs::create_dir_all("logs")?;

    // Log file naming pattern: {command}_{date}.log
    let log_filename = format!(
        "{}_{}.log",
        command_name,
        chrono::Local::now().format("%Y-%m-%d_%H-%M-%S")
    );
    let log_path = PathBuf::from("logs").join(&log_filename);

    let level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let file_appender = tracing_appender::rolling::never("logs", &log_filename);

    // Console on stderr so stdout only carries the summary
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(true);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file_appender)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .init();

    info!("Logging initialized");
    info!("Log file: {}", log_path.display());

    Ok(())
}

fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let cli = Cli::parse();

    setup_logging(cli.verbose, "convert")?;

    commands::convert::run(cli)
}
