//! Data provider traits and structured error types.
//!
//! `HistoryProvider` abstracts over the historical-price source (Yahoo Finance,
//! or a scripted provider in tests). `ConstituentSource` answers which tickers
//! belong to an index. Retry lives above these traits; providers make exactly
//! one attempt per call.

use crate::domain::{HistoryRequest, RawRow};
use std::collections::BTreeMap;
use thiserror::Error;

/// Structured error types for provider operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider: Too Many Requests")]
    RateLimited,

    #[error("HTTP {status} for {symbol}")]
    Http { status: u16, symbol: String },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("no tickers requested")]
    EmptyRequest,

    #[error("data error: {0}")]
    Other(String),
}

impl DataError {
    /// Whether this error, hit on one symbol, should fail the whole batch call.
    ///
    /// Transient failures (rate limits, transport, 5xx, unreadable bodies) make
    /// the batch retryable. Not-found and other 4xx answers only drop the symbol.
    pub fn is_batch_wide(&self) -> bool {
        match self {
            DataError::RateLimited
            | DataError::NetworkUnreachable(_)
            | DataError::ResponseFormatChanged(_) => true,
            DataError::Http { status, .. } => *status >= 500,
            DataError::SymbolNotFound { .. } | DataError::EmptyRequest | DataError::Other(_) => {
                false
            }
        }
    }
}

/// Shape of a successful history response.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryFrame {
    /// Per-ticker outcome; returned for multi-ticker requests.
    /// A requested ticker may be absent or carry its own error.
    Grouped(BTreeMap<String, Result<Vec<RawRow>, DataError>>),
    /// One flat table; returned when exactly one ticker was requested.
    Flat(Vec<RawRow>),
}

/// Source of historical price series.
pub trait HistoryProvider {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch the history of every ticker in one call.
    fn download(
        &self,
        tickers: &[String],
        request: &HistoryRequest,
    ) -> Result<HistoryFrame, DataError>;
}

/// Source of index membership lists.
///
/// `Ok(None)` means the source has no data for the index.
pub trait ConstituentSource {
    fn constituents(&self, index: &str) -> Result<Option<Vec<String>>, DataError>;
}
