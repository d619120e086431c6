//! Append-only error log for per-ticker and per-batch failures.
//!
//! Entries are advisory: nothing in the pipeline reads them back.

use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

use crate::batch::Batch;

/// One failure worth recording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorEvent {
    /// A single ticker could not be extracted from an otherwise good response.
    Ticker { ticker: String, detail: String },
    /// A whole batch failed after every retry.
    Batch { batch: Batch, detail: String },
}

impl fmt::Display for ErrorEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorEvent::Ticker { ticker, detail } => write!(f, "Errore {ticker}: {detail}"),
            ErrorEvent::Batch { batch, detail } => write!(f, "Errore batch {batch}: {detail}"),
        }
    }
}

/// Destination for error events.
pub trait ErrorSink {
    fn record(&self, event: &ErrorEvent);
}

/// Appends one line per event to a text file, opening it per write.
#[derive(Debug, Clone)]
pub struct FileErrorLog {
    path: PathBuf,
}

impl FileErrorLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")
    }
}

impl ErrorSink for FileErrorLog {
    fn record(&self, event: &ErrorEvent) {
        if let Err(e) = self.append(&event.to_string()) {
            warn!(path = %self.path.display(), error = %e, "failed to append to error log");
        }
    }
}

/// Keeps events in memory.
#[derive(Debug, Default)]
pub struct MemoryErrorLog {
    events: Mutex<Vec<ErrorEvent>>,
}

impl MemoryErrorLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ErrorEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).is_empty()
    }
}

impl ErrorSink for MemoryErrorLog {
    fn record(&self, event: &ErrorEvent) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(event.clone());
    }
}
