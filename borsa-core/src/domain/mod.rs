//! Domain types: request descriptors, price rows, ticker tables.

pub mod record;
pub mod request;
pub mod ticker;

pub use record::{PriceRecord, RawRow, TickerTable};
pub use request::{DescriptorError, HistoryRequest, Interval, Period};
pub use ticker::{dedup_symbols, sanitize_ticker};
