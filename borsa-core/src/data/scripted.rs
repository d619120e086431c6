//! Scripted in-memory provider for tests and dry runs.
//!
//! Produces deterministic daily rows for any ticker, and can be told to fail
//! whole calls, omit tickers from grouped responses, or serve fixed close
//! series. Every `download` call is recorded.

use super::provider::{ConstituentSource, DataError, HistoryFrame, HistoryProvider};
use crate::domain::{HistoryRequest, RawRow};
use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    days: usize,
    closes: HashMap<String, Vec<f64>>,
    omitted: HashSet<String>,
    poisoned: HashSet<String>,
    symbol_errors: HashMap<String, DataError>,
    always_fail: Option<DataError>,
    fail_first: Mutex<usize>,
    constituents: Option<Result<Vec<String>, DataError>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedProvider {
    /// Serve `days` complete daily rows (plus one incomplete trailing row) per ticker.
    pub fn synthetic(days: usize) -> Self {
        Self {
            days,
            ..Default::default()
        }
    }

    /// Serve exactly these closes for `ticker`.
    pub fn with_closes(mut self, ticker: &str, closes: &[f64]) -> Self {
        self.closes.insert(ticker.to_string(), closes.to_vec());
        self
    }

    /// Leave `ticker` out of grouped responses.
    pub fn omitting(mut self, ticker: &str) -> Self {
        self.omitted.insert(ticker.to_string());
        self
    }

    /// Fail every call whose batch contains `ticker`.
    pub fn poisoning(mut self, ticker: &str) -> Self {
        self.poisoned.insert(ticker.to_string());
        self
    }

    /// Report `err` for `ticker` inside grouped responses; siblings still succeed.
    pub fn failing_symbol(mut self, ticker: &str, err: DataError) -> Self {
        self.symbol_errors.insert(ticker.to_string(), err);
        self
    }

    /// Fail every call.
    pub fn always_failing(mut self, err: DataError) -> Self {
        self.always_fail = Some(err);
        self
    }

    /// Fail the first `n` calls with a rate-limit error.
    pub fn failing_first(self, n: usize) -> Self {
        *self.fail_first.lock().unwrap_or_else(|e| e.into_inner()) = n;
        self
    }

    /// Answer constituent queries with `members`.
    pub fn with_constituents(mut self, members: Vec<String>) -> Self {
        self.constituents = Some(Ok(members));
        self
    }

    /// Answer constituent queries with an error.
    pub fn with_constituents_error(mut self, err: DataError) -> Self {
        self.constituents = Some(Err(err));
        self
    }

    /// Batches requested so far, in call order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn rows_for(&self, ticker: &str) -> Vec<RawRow> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or(NaiveDate::MIN);
        let closes: Vec<f64> = match self.closes.get(ticker) {
            Some(c) => c.clone(),
            None => (0..self.days).map(|i| 100.0 + i as f64).collect(),
        };

        let mut rows: Vec<RawRow> = closes
            .iter()
            .enumerate()
            .map(|(i, &close)| RawRow {
                timestamp: (start + Duration::days(i as i64)).and_time(chrono::NaiveTime::MIN),
                open: Some(close - 0.5),
                high: Some(close + 1.0),
                low: Some(close - 1.0),
                close: Some(close),
                adj_close: Some(close * 0.98),
                volume: Some(1_000 + i as u64),
            })
            .collect();

        // Partial bar for the current session, as live providers return.
        rows.push(RawRow {
            timestamp: (start + Duration::days(closes.len() as i64)).and_time(chrono::NaiveTime::MIN),
            open: Some(1.0),
            high: None,
            low: None,
            close: None,
            adj_close: None,
            volume: None,
        });
        rows
    }
}

impl HistoryProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn download(
        &self,
        tickers: &[String],
        _request: &HistoryRequest,
    ) -> Result<HistoryFrame, DataError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(tickers.to_vec());

        if let Some(err) = &self.always_fail {
            return Err(err.clone());
        }
        {
            let mut remaining = self.fail_first.lock().unwrap_or_else(|e| e.into_inner());
            if *remaining > 0 {
                *remaining -= 1;
                return Err(DataError::RateLimited);
            }
        }
        if let Some(t) = tickers.iter().find(|t| self.poisoned.contains(*t)) {
            return Err(DataError::Other(format!("scripted failure for {t}")));
        }

        match tickers {
            [] => Err(DataError::EmptyRequest),
            [single] => Ok(HistoryFrame::Flat(self.rows_for(single))),
            many => Ok(HistoryFrame::Grouped(
                many.iter()
                    .filter(|t| !self.omitted.contains(*t))
                    .map(|t| match self.symbol_errors.get(t) {
                        Some(err) => (t.clone(), Err(err.clone())),
                        None => (t.clone(), Ok(self.rows_for(t))),
                    })
                    .collect::<BTreeMap<_, _>>(),
            )),
        }
    }
}

impl ConstituentSource for ScriptedProvider {
    fn constituents(&self, _index: &str) -> Result<Option<Vec<String>>, DataError> {
        match &self.constituents {
            None => Ok(None),
            Some(Ok(members)) => Ok(Some(members.clone())),
            Some(Err(e)) => Err(e.clone()),
        }
    }
}
