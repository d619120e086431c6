//! Borsa CLI — download the price history of an index's constituents.
//!
//! One invocation resolves the index members, fetches them from Yahoo
//! Finance in throttled batches, and writes per-ticker CSVs, the combined
//! history, summary statistics and a run manifest. Failures of single
//! batches or tickers go to the error log and never fail the process.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use borsa_core::data::{ConstituentSource, IndexUniverse, YahooProvider};
use borsa_core::domain::{Interval, Period};
use borsa_core::{FileErrorLog, ThreadSleeper};
use borsa_runner::{run_download, RunConfig, RunContext, StdoutProgress};

#[derive(Parser)]
#[command(
    name = "borsa",
    about = "Borsa — batch download of index constituents' price history"
)]
struct Cli {
    /// Path to a TOML run config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Index whose constituents are downloaded. Defaults to FTSEMIB.MI.
    #[arg(long)]
    index: Option<String>,

    /// History length (1mo, 3mo, 6mo, 1y, 5y, max, ...). Defaults to 1y.
    #[arg(long)]
    period: Option<Period>,

    /// Sampling interval (1d, 1wk, 1mo, ...). Defaults to 1d.
    #[arg(long)]
    interval: Option<Interval>,

    /// Tickers per provider call. Defaults to 5.
    #[arg(long)]
    batch_size: Option<usize>,

    /// Output directory for CSV files and the manifest. Defaults to ".".
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Append-only error log. Defaults to errors.log.
    #[arg(long)]
    error_log: Option<PathBuf>,

    /// TOML file listing index members, used instead of the provider.
    #[arg(long)]
    universe: Option<PathBuf>,
}

impl Cli {
    /// Defaults, then the config file, then flags.
    fn resolve_config(&self) -> Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(index) = &self.index {
            config.index = index.clone();
        }
        if let Some(period) = &self.period {
            config.period = period.clone();
        }
        if let Some(interval) = &self.interval {
            config.interval = interval.clone();
        }
        if let Some(n) = self.batch_size {
            config.batch_size = n;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(path) = &self.error_log {
            config.error_log = path.clone();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    let provider = YahooProvider::new().context("failed to build HTTP client")?;
    let universe = cli
        .universe
        .as_deref()
        .map(IndexUniverse::from_file)
        .transpose()?;
    let constituents: &dyn ConstituentSource = match &universe {
        Some(u) => u,
        None => &provider,
    };

    let sleeper = ThreadSleeper;
    let errors = FileErrorLog::new(&config.error_log);
    let progress = StdoutProgress;

    let report = run_download(
        &config,
        &RunContext {
            provider: &provider,
            constituents,
            sleeper: &sleeper,
            errors: &errors,
            progress: &progress,
        },
    )?;

    println!(
        "Done: {} tickers scheduled, {} retrieved, results in {}",
        report.tickers_scheduled(),
        report.outcome.tables.len(),
        config.output_dir.display()
    );
    if report.outcome.batches_failed() > 0 {
        println!("Failures recorded in {}", config.error_log.display());
    }

    Ok(())
}
