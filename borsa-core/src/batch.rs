//! Batch planning: fixed-size contiguous slices of the ticker list.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("invalid configuration: batch size must be positive, got {0}")]
    InvalidConfiguration(usize),
}

/// Ordered group of tickers fetched in one provider call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    tickers: Vec<String>,
}

impl Batch {
    pub fn new(tickers: Vec<String>) -> Self {
        Self { tickers }
    }

    pub fn tickers(&self) -> &[String] {
        &self.tickers
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.tickers.join(", "))
    }
}

/// Split `tickers` into batches of `batch_size`; the last batch holds the remainder.
pub fn plan_batches(tickers: &[String], batch_size: usize) -> Result<Vec<Batch>, PlanError> {
    if batch_size == 0 {
        return Err(PlanError::InvalidConfiguration(batch_size));
    }
    Ok(tickers
        .chunks(batch_size)
        .map(|chunk| Batch::new(chunk.to_vec()))
        .collect())
}
