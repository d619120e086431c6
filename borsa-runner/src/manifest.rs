//! Run manifest export (JSON).
//!
//! Written next to the CSV outputs so a run can be identified later: what
//! was asked for, what came back, and a hash of the combined dataset.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::RunConfig;
use crate::export::OutputSummary;
use crate::pipeline::RunOutcome;

pub const MANIFEST_FILE: &str = "run_manifest.json";
pub const MANIFEST_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunManifest {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub index: String,
    pub period: String,
    pub interval: String,
    pub batch_size: usize,
    pub tickers_scheduled: Vec<String>,
    pub tickers_retrieved: Vec<String>,
    /// Failed batches, rendered as `[A, B]`.
    pub failed_batches: Vec<String>,
    /// File names relative to the output directory.
    pub files: Vec<String>,
    pub dataset_hash: Option<String>,
}

impl RunManifest {
    pub fn build(
        config: &RunConfig,
        tickers: &[String],
        outcome: &RunOutcome,
        outputs: &OutputSummary,
    ) -> Self {
        let files = outputs
            .files()
            .iter()
            .filter_map(|p| p.file_name())
            .map(|name| name.to_string_lossy().into_owned())
            .collect();

        Self {
            schema_version: MANIFEST_SCHEMA_VERSION,
            generated_at: Utc::now(),
            index: config.index.clone(),
            period: config.period.to_string(),
            interval: config.interval.to_string(),
            batch_size: config.batch_size,
            tickers_scheduled: tickers.to_vec(),
            tickers_retrieved: outcome
                .tickers_retrieved()
                .into_iter()
                .map(str::to_string)
                .collect(),
            failed_batches: outcome.failed_batches.iter().map(|b| b.to_string()).collect(),
            files,
            dataset_hash: outputs.dataset_hash.clone(),
        }
    }
}

/// Serialize the manifest into `output_dir`, returning the path written.
pub fn write_manifest(output_dir: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let path = output_dir.join(MANIFEST_FILE);
    let json =
        serde_json::to_string_pretty(manifest).context("Failed to serialize run manifest")?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write manifest to {}", path.display()))?;
    Ok(path)
}
