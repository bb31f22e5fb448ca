//! Convert command implementation

use anyhow::Result;
use interval_bars::config::{InvalidNumberPolicy, WindowSpan};
use interval_bars::{pipeline, Config, Symbol};
use tracing::{debug, info};

use crate::Cli;

pub fn run(cli: Cli) -> Result<()> {
    info!("Starting conversion");

    let mut config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)?;
            info!("Loaded configuration from: {}", path.display());
            config
        }
        None => Config::default(),
    };

    // Apply overrides
    if cli.full_window {
        info!("Using every bar of each window for high/low/volume");
        config.window_span = WindowSpan::Full;
    }
    if cli.strict {
        config.invalid_numbers = InvalidNumberPolicy::Fail;
    }
    if cli.header {
        config.write_header = true;
    }
    config.validate()?;
    debug!("Config: {:?}", config);

    let output = match cli.output {
        Some(path) => path,
        None => pipeline::default_output_path(&cli.input, &config.output_prefix)?,
    };

    let base = cli.base_time.unwrap_or_else(|| config.clock.now());
    info!("Base time: {}", base);

    let instrument = Symbol::new(&cli.instrument_id);
    let summary = pipeline::convert_file(&cli.input, &output, &instrument, base, &config)?;

    println!("\n{}", "=".repeat(60));
    println!("CONVERSION RESULTS");
    println!("{}", "=".repeat(60));
    println!("Instrument:         {}", instrument);
    println!("Rows Read:          {}", summary.rows_read);
    println!("Rows Kept:          {}", summary.records_kept);
    println!("Dropped (missing):  {}", summary.dropped_missing);
    println!("Dropped (invalid):  {}", summary.dropped_invalid);
    for (window, count) in &summary.aggregates {
        println!("{:<20}{}", format!("Window {}:", window), count);
    }
    println!("Rows Written:       {}", summary.rows_written);
    println!("Output:             {}", summary.output_path.display());
    println!("{}", "=".repeat(60));

    info!("Conversion completed successfully");

    Ok(())
}
