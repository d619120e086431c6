//! Serializable run configuration.
//!
//! Loaded from TOML; every field has a default so a config file only needs
//! the values it changes. CLI flags are applied on top by the binary.

use borsa_core::data::DEFAULT_INDEX;
use borsa_core::domain::{HistoryRequest, Interval, Period};
use borsa_core::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Everything one run needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RunConfig {
    /// Index whose constituents are downloaded.
    pub index: String,

    /// History length (`1mo`, `1y`, `max`, ...).
    pub period: Period,

    /// Sampling interval (`1d`, `1wk`, `1mo`, ...).
    pub interval: Interval,

    /// Tickers per provider call.
    pub batch_size: usize,

    /// Where CSV outputs and the manifest are written.
    pub output_dir: PathBuf,

    /// Append-only failure log, relative to the working directory.
    pub error_log: PathBuf,

    pub throttle: ThrottleConfig,

    pub retry: RetryConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            index: DEFAULT_INDEX.to_string(),
            period: Period::OneYear,
            interval: Interval::Daily,
            batch_size: 5,
            output_dir: PathBuf::from("."),
            error_log: PathBuf::from("errors.log"),
            throttle: ThrottleConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Random pause between batches, uniform in `[min_secs, max_secs]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThrottleConfig {
    pub min_secs: f64,
    pub max_secs: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            min_secs: 1.0,
            max_secs: 3.0,
        }
    }
}

/// Backoff settings for whole-batch provider failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub multiplier: f64,
    pub min_delay_secs: f64,
    pub max_delay_secs: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            max_attempts: p.max_attempts,
            multiplier: p.multiplier,
            min_delay_secs: p.min_delay.as_secs_f64(),
            max_delay_secs: p.max_delay.as_secs_f64(),
        }
    }
}

impl RetryConfig {
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            multiplier: self.multiplier,
            min_delay: Duration::from_secs_f64(self.min_delay_secs),
            max_delay: Duration::from_secs_f64(self.max_delay_secs),
        }
    }
}

impl RunConfig {
    /// Load a config from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse a config from a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn request(&self) -> HistoryRequest {
        HistoryRequest::new(self.period.clone(), self.interval.clone())
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::InvalidConfiguration(msg));

        if self.index.trim().is_empty() {
            return invalid("index must not be empty".into());
        }
        if self.batch_size == 0 {
            return invalid("batch_size must be positive".into());
        }
        if self.retry.max_attempts == 0 {
            return invalid("retry.max_attempts must be positive".into());
        }
        let non_negative = |v: f64| v.is_finite() && v >= 0.0;
        if !non_negative(self.throttle.min_secs) || !non_negative(self.throttle.max_secs) {
            return invalid("throttle bounds must be finite and non-negative".into());
        }
        if self.throttle.min_secs > self.throttle.max_secs {
            return invalid(format!(
                "throttle.min_secs ({}) exceeds throttle.max_secs ({})",
                self.throttle.min_secs, self.throttle.max_secs
            ));
        }
        if !non_negative(self.retry.min_delay_secs)
            || !non_negative(self.retry.max_delay_secs)
            || !non_negative(self.retry.multiplier)
        {
            return invalid("retry delays and multiplier must be finite and non-negative".into());
        }
        if self.retry.min_delay_secs > self.retry.max_delay_secs {
            return invalid(format!(
                "retry.min_delay_secs ({}) exceeds retry.max_delay_secs ({})",
                self.retry.min_delay_secs, self.retry.max_delay_secs
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let c = RunConfig::default();
        assert_eq!(c.index, "FTSEMIB.MI");
        assert_eq!(c.period.as_str(), "1y");
        assert_eq!(c.interval.as_str(), "1d");
        assert_eq!(c.batch_size, 5);
        assert_eq!(c.error_log, PathBuf::from("errors.log"));
        assert_eq!(c.retry.policy(), RetryPolicy::default());
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let c = RunConfig::from_toml(
            r#"
index = "FTSESTAR.MI"
period = "5y"
batch_size = 10

[throttle]
max_secs = 5.0
"#,
        )
        .unwrap();
        assert_eq!(c.index, "FTSESTAR.MI");
        assert_eq!(c.period, Period::FiveYears);
        assert_eq!(c.interval, Interval::Daily);
        assert_eq!(c.batch_size, 10);
        assert_eq!(c.throttle.min_secs, 1.0);
        assert_eq!(c.throttle.max_secs, 5.0);
        assert_eq!(c.retry.max_attempts, 5);
    }

    #[test]
    fn empty_period_fails_to_parse() {
        assert!(matches!(
            RunConfig::from_toml(r#"period = """#),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn zero_batch_size_is_invalid() {
        let c = RunConfig {
            batch_size: 0,
            ..RunConfig::default()
        };
        assert!(matches!(
            c.validate(),
            Err(ConfigError::InvalidConfiguration(msg)) if msg.contains("batch_size")
        ));
    }

    #[test]
    fn inverted_throttle_is_invalid() {
        let mut c = RunConfig::default();
        c.throttle = ThrottleConfig {
            min_secs: 4.0,
            max_secs: 2.0,
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn toml_roundtrip() {
        let c = RunConfig::default();
        let text = toml::to_string(&c).unwrap();
        assert_eq!(RunConfig::from_toml(&text).unwrap(), c);
    }
}
