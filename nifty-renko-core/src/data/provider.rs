//! Data provider trait and structured error types.
//!
//! The DataProvider trait abstracts over the daily-bar source so the runner
//! can be driven by Yahoo Finance in production and by fixtures in tests.

use crate::domain::Bar;
use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Structured error types for data operations.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("rate limited by provider (retry after {retry_after_secs}s)")]
    RateLimited { retry_after_secs: u64 },

    #[error("response format changed: {0}")]
    ResponseFormatChanged(String),

    #[error("authentication required: {0}")]
    AuthenticationRequired(String),

    #[error("symbol not found: {symbol}")]
    SymbolNotFound { symbol: String },

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error("data error: {0}")]
    Other(String),
}

/// Result of a successful fetch. Bars are raw: they may still contain void
/// rows, duplicates or unsorted dates until passed through `clean_bars`.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub symbol: String,
    pub bars: Vec<Bar>,
    pub source: DataSource,
}

/// Where the data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataSource {
    YahooFinance,
    Fixture,
}

/// Trait for daily-bar providers.
pub trait DataProvider: Send + Sync {
    /// Human-readable name of this provider.
    fn name(&self) -> &str;

    /// Fetch daily OHLCV bars for a symbol over an inclusive date range.
    fn fetch(&self, symbol: &str, start: NaiveDate, end: NaiveDate)
        -> Result<FetchResult, DataError>;
}

/// Inclusive `[start, end]` window covering `months` calendar months up to `end`.
pub fn lookback_window(end: NaiveDate, months: u32) -> Result<(NaiveDate, NaiveDate), DataError> {
    let start = end
        .checked_sub_months(Months::new(months))
        .ok_or_else(|| DataError::InvalidRange(format!("{months} months before {end}")))?;
    Ok((start, end))
}
