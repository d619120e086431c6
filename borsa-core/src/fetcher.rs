//! Batch fetcher: one provider call per batch, retried with backoff, split into
//! one table per ticker.

use thiserror::Error;
use tracing::{debug, warn};

use crate::batch::Batch;
use crate::data::normalize::build_table;
use crate::data::provider::{DataError, HistoryFrame, HistoryProvider};
use crate::domain::{HistoryRequest, TickerTable};
use crate::error_log::{ErrorEvent, ErrorSink};
use crate::retry::{RetryError, RetryPolicy, Sleeper};

#[derive(Debug, Clone, Error)]
pub enum FetchError {
    #[error("gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: DataError },
}

impl From<RetryError<DataError>> for FetchError {
    fn from(e: RetryError<DataError>) -> Self {
        FetchError::RetriesExhausted {
            attempts: e.attempts,
            last: e.last,
        }
    }
}

/// Fetches batches through a provider, retrying whole-call failures.
///
/// Every provider error is treated as transient. Tickers that failed or are
/// missing in a grouped response are reported to the error sink with their
/// error detail and skipped; tickers with
/// no usable rows are skipped with a warning.
pub struct RetryingFetcher<'a> {
    provider: &'a dyn HistoryProvider,
    policy: RetryPolicy,
    sleeper: &'a dyn Sleeper,
    errors: &'a dyn ErrorSink,
}

impl<'a> RetryingFetcher<'a> {
    pub fn new(
        provider: &'a dyn HistoryProvider,
        sleeper: &'a dyn Sleeper,
        errors: &'a dyn ErrorSink,
    ) -> Self {
        Self {
            provider,
            policy: RetryPolicy::default(),
            sleeper,
            errors,
        }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetch one batch, returning a table for every ticker with usable data.
    pub fn fetch_batch(
        &self,
        batch: &Batch,
        request: &HistoryRequest,
    ) -> Result<Vec<TickerTable>, FetchError> {
        let frame = self.policy.run(self.sleeper, |attempt| {
            debug!(
                provider = self.provider.name(),
                %batch,
                attempt,
                "downloading batch"
            );
            self.provider.download(batch.tickers(), request)
        })?;

        Ok(self.split_frame(batch, frame))
    }

    fn split_frame(&self, batch: &Batch, frame: HistoryFrame) -> Vec<TickerTable> {
        let tables: Vec<TickerTable> = match frame {
            HistoryFrame::Grouped(mut by_ticker) => batch
                .tickers()
                .iter()
                .filter_map(|ticker| {
                    let detail = match by_ticker.remove(ticker) {
                        Some(Ok(rows)) => return Some(build_table(ticker, &rows)),
                        Some(Err(e)) => e.to_string(),
                        None => "missing from provider response".to_string(),
                    };
                    self.errors.record(&ErrorEvent::Ticker {
                        ticker: ticker.clone(),
                        detail,
                    });
                    None
                })
                .collect(),
            HistoryFrame::Flat(rows) => batch
                .tickers()
                .first()
                .map(|ticker| build_table(ticker, &rows))
                .into_iter()
                .collect(),
        };

        tables
            .into_iter()
            .filter(|table| {
                if table.is_empty() {
                    warn!(ticker = %table.ticker, "no usable rows, skipping");
                }
                !table.is_empty()
            })
            .collect()
    }
}
