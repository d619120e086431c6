//! Borsa Core — domain types, providers, batch planning, retry, fetching.
//!
//! This crate holds everything below the pipeline driver:
//! - Request descriptors (period, interval) and price tables
//! - Provider traits with a Yahoo Finance implementation and a scripted double
//! - Index constituent resolution with a fixed fallback list
//! - Batch planning, bounded exponential backoff, the retrying batch fetcher
//! - The append-only error log

pub mod batch;
pub mod data;
pub mod domain;
pub mod error_log;
pub mod fetcher;
pub mod retry;

pub use batch::{plan_batches, Batch, PlanError};
pub use error_log::{ErrorEvent, ErrorSink, FileErrorLog, MemoryErrorLog};
pub use fetcher::{FetchError, RetryingFetcher};
pub use retry::{RecordingSleeper, RetryError, RetryPolicy, Sleeper, ThreadSleeper};
