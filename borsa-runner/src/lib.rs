//! Borsa Runner — batch download orchestration, CSV export, summary stats.
//!
//! This crate builds on `borsa-core` to provide:
//! - Serializable run configuration (TOML, all fields defaulted)
//! - The pipeline driver with inter-batch throttling and progress callbacks
//! - Per-ticker and combined CSV export, summary statistics
//! - A JSON run manifest with a dataset hash

pub mod config;
pub mod export;
pub mod manifest;
pub mod pipeline;
pub mod runner;
pub mod stats;

pub use config::{ConfigError, RetryConfig, RunConfig, ThrottleConfig};
pub use export::{write_outputs, OutputSummary, HISTORY_FILE, SUMMARY_FILE};
pub use manifest::{write_manifest, RunManifest, MANIFEST_FILE};
pub use pipeline::{BatchProgress, PipelineDriver, RunOutcome, SilentProgress, StdoutProgress, Throttle};
pub use runner::{run_download, RunContext, RunError, RunReport};
pub use stats::{summarize, SummaryRow};
