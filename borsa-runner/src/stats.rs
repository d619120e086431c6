//! Per-ticker summary statistics of closing prices.

use borsa_core::domain::TickerTable;
use serde::Serialize;
use std::collections::BTreeMap;

/// min / max / mean / sample standard deviation of one ticker's closes.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub ticker: String,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    /// N-1 denominator; NaN when fewer than two closes.
    pub std: f64,
}

/// Group closes by ticker and summarize each group. Rows are sorted by ticker.
pub fn summarize(tables: &[TickerTable]) -> Vec<SummaryRow> {
    let mut closes: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for table in tables {
        closes
            .entry(table.ticker.as_str())
            .or_default()
            .extend(table.closes());
    }

    closes
        .into_iter()
        .filter(|(_, values)| !values.is_empty())
        .map(|(ticker, values)| SummaryRow {
            ticker: ticker.to_string(),
            min: values.iter().copied().fold(f64::INFINITY, f64::min),
            max: values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            mean: mean(&values),
            std: sample_std(&values),
        })
        .collect()
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation; NaN for fewer than two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return f64::NAN;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n - 1) as f64).sqrt()
}
