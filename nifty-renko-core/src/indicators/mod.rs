//! Indicators used by the decision rule.
//!
//! Both are pure functions of the bar history: the Renko builder consumes
//! closes, the stochastic oscillator consumes high/low/close. Undefined
//! oscillator values are `None` rather than NaN so that comparisons against
//! them are explicit.

pub mod renko;
pub mod stochastic;

pub use renko::{build_bricks, RenkoBuilder};
pub use stochastic::StochasticK;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    #[error("brick size must be finite and > 0, got {0}")]
    InvalidBrickSize(f64),

    #[error("stochastic period must be >= 1, got {0}")]
    InvalidPeriod(usize),

    #[error("non-finite input price at index {index}: {value}")]
    NonFiniteInput { index: usize, value: f64 },
}

/// Create synthetic bars from close prices for testing.
///
/// Generates plausible OHLV: open = prev_close (or close for first bar),
/// high = max(open,close) + 1.0, low = min(open,close) - 1.0, volume = 1000.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<crate::domain::Bar> {
    use crate::domain::Bar;
    let base_date = chrono::NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            Bar {
                date: base_date + chrono::Duration::days(i as i64),
                open,
                high: open.max(close) + 1.0,
                low: open.min(close) - 1.0,
                close,
                volume: 1000,
            }
        })
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
