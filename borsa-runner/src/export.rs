//! CSV export — per-ticker files, the combined history, summary statistics.
//!
//! Output files:
//! - `{ticker}_{period}_{interval}.csv` per non-empty ticker table
//! - `all_history.csv` with every row of every table, in collection order
//! - `summary_stats.csv` with min/max/mean/std of closes per ticker
//!
//! The combined and summary files are only written when at least one table
//! exists.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use borsa_core::domain::{sanitize_ticker, HistoryRequest, TickerTable};

use crate::stats::{summarize, SummaryRow};

pub const HISTORY_FILE: &str = "all_history.csv";
pub const SUMMARY_FILE: &str = "summary_stats.csv";

const PRICE_COLUMNS: [&str; 8] = [
    "date",
    "open",
    "high",
    "low",
    "close",
    "adj_close",
    "volume",
    "ticker",
];

// ─── CSV rendering ──────────────────────────────────────────────────

/// `{sanitized ticker}_{period}_{interval}.csv`
pub fn ticker_file_name(ticker: &str, request: &HistoryRequest) -> String {
    format!(
        "{}_{}_{}.csv",
        sanitize_ticker(ticker),
        request.period,
        request.interval
    )
}

/// Render tables as one price CSV, rows in table order.
pub fn export_prices_csv<'a>(tables: impl IntoIterator<Item = &'a TickerTable>) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(PRICE_COLUMNS)?;

    for table in tables {
        for r in &table.records {
            wtr.write_record([
                &r.date_label(),
                &r.open.to_string(),
                &r.high.to_string(),
                &r.low.to_string(),
                &r.close.to_string(),
                &r.adj_close.to_string(),
                &r.volume.to_string(),
                &table.ticker,
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Render summary rows; NaN becomes an empty field.
pub fn export_summary_csv(rows: &[SummaryRow]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["ticker", "min", "max", "mean", "std"])?;

    let num = |v: f64| if v.is_nan() { String::new() } else { v.to_string() };
    for row in rows {
        wtr.write_record([
            row.ticker.clone(),
            num(row.min),
            num(row.max),
            num(row.mean),
            num(row.std),
        ])?;
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── Output bundle ──────────────────────────────────────────────────

/// What `write_outputs` produced.
#[derive(Debug, Clone, Default)]
pub struct OutputSummary {
    pub ticker_files: Vec<PathBuf>,
    pub history_file: Option<PathBuf>,
    pub summary_file: Option<PathBuf>,
    pub summary: Vec<SummaryRow>,
    /// BLAKE3 hex digest of the combined history CSV.
    pub dataset_hash: Option<String>,
    /// `(earlier, later)` tickers whose files share a sanitized name; the
    /// later ticker's file replaced the earlier one.
    pub name_collisions: Vec<(String, String)>,
}

impl OutputSummary {
    /// Every file written, in write order.
    pub fn files(&self) -> Vec<&Path> {
        self.ticker_files
            .iter()
            .chain(self.history_file.iter())
            .chain(self.summary_file.iter())
            .map(|p| p.as_path())
            .collect()
    }
}

/// Write per-ticker files, then the combined history and summary.
pub fn write_outputs(
    tables: &[TickerTable],
    request: &HistoryRequest,
    output_dir: &Path,
) -> Result<OutputSummary> {
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("failed to create output dir: {}", output_dir.display()))?;

    let mut out = OutputSummary::default();
    let mut owners: HashMap<String, &str> = HashMap::new();

    for table in tables.iter().filter(|t| !t.is_empty()) {
        let name = ticker_file_name(&table.ticker, request);
        let previous = owners.insert(name.clone(), &table.ticker);
        if let Some(previous) = previous {
            if previous != table.ticker {
                tracing::warn!(
                    file = %name,
                    earlier = previous,
                    later = %table.ticker,
                    "tickers map to the same file name, overwriting"
                );
                out.name_collisions
                    .push((previous.to_string(), table.ticker.clone()));
            }
        }
        let path = output_dir.join(name);
        let csv = export_prices_csv([table])?;
        std::fs::write(&path, csv)
            .with_context(|| format!("failed to write {}", path.display()))?;
        if previous.is_none() {
            out.ticker_files.push(path);
        }
    }

    if tables.is_empty() {
        tracing::info!("no ticker tables retrieved, skipping combined and summary files");
        return Ok(out);
    }

    let history = export_prices_csv(tables)?;
    let history_path = output_dir.join(HISTORY_FILE);
    std::fs::write(&history_path, &history)
        .with_context(|| format!("failed to write {}", history_path.display()))?;
    out.dataset_hash = Some(blake3::hash(history.as_bytes()).to_hex().to_string());
    out.history_file = Some(history_path);

    out.summary = summarize(tables);
    let summary_path = output_dir.join(SUMMARY_FILE);
    std::fs::write(&summary_path, export_summary_csv(&out.summary)?)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    out.summary_file = Some(summary_path);

    Ok(out)
}
