//! Index universe file — index identifiers mapped to member tickers.
//!
//! Stored as TOML:
//!
//! ```toml
//! [indexes]
//! "FTSEMIB.MI" = ["ENI.MI", "ENEL.MI", "ISP.MI"]
//! ```
//!
//! Acts as a `ConstituentSource` for providers that cannot list index members.

use super::provider::{ConstituentSource, DataError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum UniverseError {
    #[error("read universe file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse universe TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The complete universe configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IndexUniverse {
    #[serde(default)]
    pub indexes: BTreeMap<String, Vec<String>>,
}

impl IndexUniverse {
    /// Load a universe from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, UniverseError> {
        let content = std::fs::read_to_string(path).map_err(|source| UniverseError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a universe from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, UniverseError> {
        Ok(toml::from_str(content)?)
    }

    /// Members of an index, if listed.
    pub fn members(&self, index: &str) -> Option<&[String]> {
        self.indexes.get(index).map(|v| v.as_slice())
    }

    /// List of index identifiers.
    pub fn index_names(&self) -> Vec<&str> {
        self.indexes.keys().map(|s| s.as_str()).collect()
    }
}

impl ConstituentSource for IndexUniverse {
    fn constituents(&self, index: &str) -> Result<Option<Vec<String>>, DataError> {
        let members = self.members(index).map(|m| m.to_vec());
        if members.is_none() {
            warn!(%index, known = ?self.index_names(), "index not listed in universe file");
        }
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[indexes]
"FTSEMIB.MI" = ["ENI.MI", "ENEL.MI", "ISP.MI"]
"TEST" = ["AAA", "BBB"]
"#;

    #[test]
    fn parses_index_table() {
        let u = IndexUniverse::from_toml(SAMPLE).unwrap();
        assert_eq!(u.index_names(), vec!["FTSEMIB.MI", "TEST"]);
        assert_eq!(u.members("TEST").unwrap(), ["AAA", "BBB"]);
    }

    #[test]
    fn unknown_index_has_no_constituents() {
        let u = IndexUniverse::from_toml(SAMPLE).unwrap();
        assert!(u.constituents("DAX").unwrap().is_none());
        assert_eq!(u.constituents("TEST").unwrap().unwrap().len(), 2);
    }

    #[test]
    fn empty_file_lists_no_indexes() {
        let u = IndexUniverse::from_toml("").unwrap();
        assert!(u.index_names().is_empty());
        assert!(u.constituents("FTSEMIB.MI").unwrap().is_none());
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let u = IndexUniverse::from_file(file.path()).unwrap();
        assert!(u.members("FTSEMIB.MI").is_some());
    }

    #[test]
    fn missing_file_reports_path() {
        let err = IndexUniverse::from_file(Path::new("/nonexistent/universe.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/universe.toml"));
    }
}
