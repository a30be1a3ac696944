//! Runner configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file at all) gives the
//! stock NIFTY setup: `^NSEI`, three months of daily bars, IST session
//! 09:17 to 15:30, brick size 20, %K over 14 bars, Firestore collection
//! `signals`.

use chrono::{FixedOffset, NaiveTime};
use nifty_renko_core::{SessionHours, StrategyParams};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunnerConfig {
    pub market: MarketConfig,
    pub strategy: StrategyParams,
    pub store: StoreConfig,
    pub http: HttpConfig,
}

/// What to fetch and when the market trades.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MarketConfig {
    pub symbol: String,
    pub lookback_months: u32,
    /// Market-local UTC offset in minutes (IST = 330).
    pub utc_offset_minutes: i32,
    pub session_open: NaiveTime,
    pub session_close: NaiveTime,
}

impl Default for MarketConfig {
    fn default() -> Self {
        let hours = SessionHours::nse();
        Self {
            symbol: "^NSEI".to_string(),
            lookback_months: 3,
            utc_offset_minutes: 330,
            session_open: hours.open,
            session_close: hours.close,
        }
    }
}

impl MarketConfig {
    pub fn session_hours(&self) -> SessionHours {
        SessionHours {
            open: self.session_open,
            close: self.session_close,
        }
    }

    pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes {} is outside +/-24h",
                self.utc_offset_minutes
            ))
        })
    }
}

/// Where signals are persisted and how to authenticate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub collection: String,
    /// Written into the `source` field of every record.
    pub source_tag: String,
    /// Env var holding the service-account JSON.
    pub credentials_env: String,
    /// Service-account file used when the env var is unset.
    pub credentials_file: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            collection: "signals".to_string(),
            source_tag: "github_actions".to_string(),
            credentials_env: "FIREBASE_SERVICE_ACCOUNT".to_string(),
            credentials_file: PathBuf::from("firebase-key.json"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HttpConfig {
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl RunnerConfig {
    /// Load and validate a config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.strategy;
        if !s.brick_size.is_finite() || s.brick_size <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "strategy.brick_size must be > 0, got {}",
                s.brick_size
            )));
        }
        if s.stoch_period < 1 {
            return Err(ConfigError::Invalid("strategy.stoch_period must be >= 1".into()));
        }
        if s.min_bars < 2 {
            return Err(ConfigError::Invalid(format!(
                "strategy.min_bars must be >= 2, got {}",
                s.min_bars
            )));
        }
        if s.oversold.is_nan() || s.overbought.is_nan() || s.oversold >= s.overbought {
            return Err(ConfigError::Invalid(format!(
                "strategy.oversold ({}) must be below strategy.overbought ({})",
                s.oversold, s.overbought
            )));
        }

        let m = &self.market;
        if m.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("market.symbol is empty".into()));
        }
        if m.lookback_months == 0 {
            return Err(ConfigError::Invalid("market.lookback_months must be >= 1".into()));
        }
        if m.session_open >= m.session_close {
            return Err(ConfigError::Invalid(format!(
                "market.session_open ({}) must be before market.session_close ({})",
                m.session_open, m.session_close
            )));
        }
        m.offset()?;

        if self.store.collection.trim().is_empty() {
            return Err(ConfigError::Invalid("store.collection is empty".into()));
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::Invalid("http.timeout_secs must be >= 1".into()));
        }
        Ok(())
    }
}
