//! Price rows and per-ticker tables.

use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

/// One provider row before validation. Any field may be missing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub timestamp: NaiveDateTime,
    pub open: Option<f64>,
    pub high: Option<f64>,
    pub low: Option<f64>,
    pub close: Option<f64>,
    pub adj_close: Option<f64>,
    pub volume: Option<u64>,
}

impl RawRow {
    /// Convert to a `PriceRecord` if every field is present and finite.
    pub fn complete(&self) -> Option<PriceRecord> {
        let finite = |v: Option<f64>| v.filter(|x| x.is_finite());
        Some(PriceRecord {
            timestamp: self.timestamp,
            open: finite(self.open)?,
            high: finite(self.high)?,
            low: finite(self.low)?,
            close: finite(self.close)?,
            adj_close: finite(self.adj_close)?,
            volume: self.volume?,
        })
    }
}

impl From<&PriceRecord> for RawRow {
    fn from(r: &PriceRecord) -> Self {
        Self {
            timestamp: r.timestamp,
            open: Some(r.open),
            high: Some(r.high),
            low: Some(r.low),
            close: Some(r.close),
            adj_close: Some(r.adj_close),
            volume: Some(r.volume),
        }
    }
}

/// One validated trading period for one ticker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

impl PriceRecord {
    /// `YYYY-MM-DD` for midnight stamps, `YYYY-MM-DD HH:MM:SS` otherwise.
    pub fn date_label(&self) -> String {
        if self.timestamp.time() == NaiveTime::MIN {
            self.timestamp.date().format("%Y-%m-%d").to_string()
        } else {
            self.timestamp.format("%Y-%m-%d %H:%M:%S").to_string()
        }
    }
}

/// Full history of one ticker for one run, ordered by timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickerTable {
    pub ticker: String,
    pub records: Vec<PriceRecord>,
}

impl TickerTable {
    pub fn new(ticker: impl Into<String>, records: Vec<PriceRecord>) -> Self {
        Self {
            ticker: ticker.into(),
            records,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.records.iter().map(|r| r.close)
    }
}
