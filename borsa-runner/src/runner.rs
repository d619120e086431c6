//! Run orchestration — config, constituents, batches, outputs, manifest.
//!
//! `run_download()` is the single entry point used by the CLI. Collaborators
//! are passed in through `RunContext` so tests can swap the provider, the
//! sleeper and the error sink.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;

use borsa_core::batch::PlanError;
use borsa_core::data::{resolve_constituents, ConstituentSource, HistoryProvider};
use borsa_core::error_log::ErrorSink;
use borsa_core::fetcher::RetryingFetcher;
use borsa_core::retry::Sleeper;

use crate::config::{ConfigError, RunConfig};
use crate::export::{write_outputs, OutputSummary};
use crate::manifest::{write_manifest, RunManifest};
use crate::pipeline::{BatchProgress, PipelineDriver, RunOutcome, Throttle};

/// Errors that abort a run. Batch and ticker failures never do.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("planning error: {0}")]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Output(#[from] anyhow::Error),
}

/// Collaborators for one run.
pub struct RunContext<'a> {
    pub provider: &'a dyn HistoryProvider,
    pub constituents: &'a dyn ConstituentSource,
    pub sleeper: &'a dyn Sleeper,
    pub errors: &'a dyn ErrorSink,
    pub progress: &'a dyn BatchProgress,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub struct RunReport {
    /// Tickers scheduled for download, in batch order.
    pub tickers: Vec<String>,
    pub outcome: RunOutcome,
    pub outputs: OutputSummary,
    /// Present only when at least one table was retrieved.
    pub manifest_file: Option<PathBuf>,
}

impl RunReport {
    pub fn tickers_scheduled(&self) -> usize {
        self.tickers.len()
    }
}

/// Resolve constituents, download every batch, write outputs.
pub fn run_download(config: &RunConfig, ctx: &RunContext<'_>) -> Result<RunReport, RunError> {
    config.validate()?;
    let request = config.request();

    let tickers = resolve_constituents(&config.index, ctx.constituents);
    info!(
        index = %config.index,
        provider = ctx.provider.name(),
        tickers = tickers.len(),
        "constituents resolved"
    );

    let fetcher = RetryingFetcher::new(ctx.provider, ctx.sleeper, ctx.errors)
        .with_policy(config.retry.policy());
    let driver = PipelineDriver::new(fetcher, ctx.sleeper, ctx.errors, ctx.progress).with_throttle(
        Throttle::from_secs(config.throttle.min_secs, config.throttle.max_secs),
    );

    let outcome = driver.run(&tickers, config.batch_size, &request)?;
    let outputs = write_outputs(&outcome.tables, &request, &config.output_dir)?;

    let manifest_file = if outcome.tables.is_empty() {
        None
    } else {
        let manifest = RunManifest::build(config, &tickers, &outcome, &outputs);
        Some(write_manifest(&config.output_dir, &manifest)?)
    };

    info!(
        retrieved = outcome.tables.len(),
        failed_batches = outcome.batches_failed(),
        output_dir = %config.output_dir.display(),
        "run finished"
    );

    Ok(RunReport {
        tickers,
        outcome,
        outputs,
        manifest_file,
    })
}
