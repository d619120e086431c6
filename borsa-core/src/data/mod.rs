//! Data sources: provider traits, Yahoo Finance, constituents, normalization

pub mod constituents;
pub mod normalize;
pub mod provider;
pub mod scripted;
pub mod universe;
pub mod yahoo;

pub use constituents::{default_tickers, resolve_constituents, DEFAULT_INDEX, DEFAULT_TICKERS};
pub use normalize::{build_table, normalize_rows};
pub use provider::{ConstituentSource, DataError, HistoryFrame, HistoryProvider};
pub use scripted::ScriptedProvider;
pub use universe::{IndexUniverse, UniverseError};
pub use yahoo::YahooProvider;
