//! Row normalization: drop incomplete rows, order by time, remove duplicate stamps.

use crate::domain::{PriceRecord, RawRow, TickerTable};

/// Turn provider rows into a clean, strictly increasing series.
///
/// Rows with any missing or non-finite field are dropped. When two rows share
/// a timestamp the first one wins.
pub fn normalize_rows(rows: &[RawRow]) -> Vec<PriceRecord> {
    let mut records: Vec<PriceRecord> = rows.iter().filter_map(RawRow::complete).collect();
    // Stable sort keeps the first of equal stamps in front for dedup.
    records.sort_by_key(|r| r.timestamp);
    records.dedup_by_key(|r| r.timestamp);
    records
}

/// Normalize rows and tag them with their ticker.
pub fn build_table(ticker: &str, rows: &[RawRow]) -> TickerTable {
    TickerTable::new(ticker, normalize_rows(rows))
}
