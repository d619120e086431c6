//! Index constituent resolution with a fixed fallback list.

use super::provider::ConstituentSource;
use crate::domain::dedup_symbols;
use tracing::{info, warn};

/// Tickers used when the source cannot list the index.
pub const DEFAULT_TICKERS: [&str; 6] = ["ENI.MI", "ENEL.MI", "ISP.MI", "UCG.MI", "LDO.MI", "STLAM.MI"];

/// Default index identifier (FTSE MIB).
pub const DEFAULT_INDEX: &str = "FTSEMIB.MI";

pub fn default_tickers() -> Vec<String> {
    DEFAULT_TICKERS.iter().map(|s| s.to_string()).collect()
}

/// Resolve the members of `index`, always returning a non-empty, duplicate-free list.
pub fn resolve_constituents(index: &str, source: &dyn ConstituentSource) -> Vec<String> {
    let reason = match source.constituents(index) {
        Ok(Some(symbols)) => {
            let cleaned = dedup_symbols(symbols);
            if !cleaned.is_empty() {
                info!(%index, count = cleaned.len(), "resolved index constituents");
                return cleaned;
            }
            "no usable symbols".to_string()
        }
        Ok(None) => "no constituent data".to_string(),
        Err(e) => e.to_string(),
    };

    warn!(%index, %reason, "falling back to default ticker list");
    default_tickers()
}
