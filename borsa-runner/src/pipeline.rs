//! Pipeline driver — walks batches in order, collecting ticker tables.
//!
//! A failed batch is logged and skipped; the run always reaches the last
//! batch. Between batches the driver pauses for a random duration inside the
//! throttle window to ease provider rate limits.

use std::time::Duration;

use borsa_core::batch::{plan_batches, Batch, PlanError};
use borsa_core::domain::{HistoryRequest, TickerTable};
use borsa_core::error_log::{ErrorEvent, ErrorSink};
use borsa_core::fetcher::{FetchError, RetryingFetcher};
use borsa_core::retry::Sleeper;
use rand::Rng;
use tracing::{info, warn};

/// Progress callback for batch runs.
pub trait BatchProgress {
    /// Called before a batch is fetched.
    fn on_batch_start(&self, batch: &Batch, index: usize, total: usize);

    /// Called after a batch; `Ok` carries the number of tables it produced.
    fn on_batch_complete(
        &self,
        batch: &Batch,
        index: usize,
        total: usize,
        result: &Result<usize, FetchError>,
    );

    /// Called once every batch has been attempted.
    fn on_run_complete(&self, succeeded: usize, failed: usize, total: usize);
}

/// Simple progress reporter that prints to stdout.
pub struct StdoutProgress;

impl BatchProgress for StdoutProgress {
    fn on_batch_start(&self, batch: &Batch, index: usize, total: usize) {
        println!("[{}/{}] Download batch {batch}...", index + 1, total);
    }

    fn on_batch_complete(
        &self,
        _batch: &Batch,
        _index: usize,
        _total: usize,
        result: &Result<usize, FetchError>,
    ) {
        match result {
            Ok(n) => println!("  OK: {n} tickers"),
            Err(e) => println!("  FAIL: {e}"),
        }
    }

    fn on_run_complete(&self, succeeded: usize, failed: usize, total: usize) {
        println!("\nDownload complete: {succeeded}/{total} batches succeeded, {failed} failed");
    }
}

/// Progress reporter that reports nothing.
pub struct SilentProgress;

impl BatchProgress for SilentProgress {
    fn on_batch_start(&self, _batch: &Batch, _index: usize, _total: usize) {}

    fn on_batch_complete(
        &self,
        _batch: &Batch,
        _index: usize,
        _total: usize,
        _result: &Result<usize, FetchError>,
    ) {
    }

    fn on_run_complete(&self, _succeeded: usize, _failed: usize, _total: usize) {}
}

/// Uniform random pause window between batches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Throttle {
    min: Duration,
    max: Duration,
}

impl Throttle {
    /// Bounds are reordered if given backwards.
    pub fn new(min: Duration, max: Duration) -> Self {
        if min <= max {
            Self { min, max }
        } else {
            Self { min: max, max: min }
        }
    }

    pub fn from_secs(min_secs: f64, max_secs: f64) -> Self {
        Self::new(
            Duration::from_secs_f64(min_secs.max(0.0)),
            Duration::from_secs_f64(max_secs.max(0.0)),
        )
    }

    /// No pause at all.
    pub fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn bounds(&self) -> (Duration, Duration) {
        (self.min, self.max)
    }

    pub fn next_delay<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        let secs = rng.gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }
}

impl Default for Throttle {
    /// 1 to 3 seconds.
    fn default() -> Self {
        Self::from_secs(1.0, 3.0)
    }
}

/// Result of a full pass over every batch.
#[derive(Debug, Default)]
pub struct RunOutcome {
    /// Tables in batch order, then in-batch ticker order.
    pub tables: Vec<TickerTable>,
    pub batches_total: usize,
    pub failed_batches: Vec<Batch>,
}

impl RunOutcome {
    pub fn batches_failed(&self) -> usize {
        self.failed_batches.len()
    }

    pub fn batches_succeeded(&self) -> usize {
        self.batches_total - self.failed_batches.len()
    }

    pub fn tickers_retrieved(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.ticker.as_str()).collect()
    }
}

/// Drives a `RetryingFetcher` over every batch of a ticker list.
pub struct PipelineDriver<'a> {
    fetcher: RetryingFetcher<'a>,
    sleeper: &'a dyn Sleeper,
    errors: &'a dyn ErrorSink,
    progress: &'a dyn BatchProgress,
    throttle: Throttle,
}

impl<'a> PipelineDriver<'a> {
    pub fn new(
        fetcher: RetryingFetcher<'a>,
        sleeper: &'a dyn Sleeper,
        errors: &'a dyn ErrorSink,
        progress: &'a dyn BatchProgress,
    ) -> Self {
        Self {
            fetcher,
            sleeper,
            errors,
            progress,
            throttle: Throttle::default(),
        }
    }

    pub fn with_throttle(mut self, throttle: Throttle) -> Self {
        self.throttle = throttle;
        self
    }

    /// Fetch every batch in order. Only an invalid batch size fails the run.
    pub fn run(
        &self,
        tickers: &[String],
        batch_size: usize,
        request: &HistoryRequest,
    ) -> Result<RunOutcome, PlanError> {
        let batches = plan_batches(tickers, batch_size)?;
        let total = batches.len();
        let mut rng = rand::thread_rng();
        let mut outcome = RunOutcome {
            batches_total: total,
            ..Default::default()
        };

        info!(
            tickers = tickers.len(),
            batches = total,
            batch_size,
            period = %request.period,
            interval = %request.interval,
            "starting batch download"
        );

        for (i, batch) in batches.into_iter().enumerate() {
            self.progress.on_batch_start(&batch, i, total);

            let result = self.fetcher.fetch_batch(&batch, request);
            let report = result.as_ref().map(Vec::len).map_err(Clone::clone);
            self.progress.on_batch_complete(&batch, i, total, &report);

            match result {
                Ok(tables) => outcome.tables.extend(tables),
                Err(e) => {
                    warn!(%batch, error = %e, "batch failed, continuing");
                    self.errors.record(&ErrorEvent::Batch {
                        batch: batch.clone(),
                        detail: e.to_string(),
                    });
                    outcome.failed_batches.push(batch);
                }
            }

            self.sleeper.sleep(self.throttle.next_delay(&mut rng));
        }

        self.progress
            .on_run_complete(outcome.batches_succeeded(), outcome.batches_failed(), total);

        Ok(outcome)
    }
}
