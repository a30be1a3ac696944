//! Stochastic %K: close position inside the rolling high/low range.
//!
//! K[t] = 100 * (close[t] - min(low[t-period+1..=t])) / (max(high[..]) - min(low[..]))
//!
//! Lookback: period - 1. Values before the first full window are `None`, and
//! so are windows where the high equals the low (division by zero) or that
//! contain a NaN.

use super::IndicatorError;
use crate::domain::Bar;

#[derive(Debug, Clone)]
pub struct StochasticK {
    period: usize,
}

impl StochasticK {
    pub fn new(period: usize) -> Result<Self, IndicatorError> {
        if period == 0 {
            return Err(IndicatorError::InvalidPeriod(period));
        }
        Ok(Self { period })
    }

    /// Compute %K for every bar. The output is aligned 1:1 with `bars`.
    pub fn compute(&self, bars: &[Bar]) -> Vec<Option<f64>> {
        let n = bars.len();
        let mut result = vec![None; n];

        if n < self.period {
            return result;
        }

        for i in (self.period - 1)..n {
            let window = &bars[i + 1 - self.period..=i];
            result[i] = Self::k_for_window(window, bars[i].close);
        }

        result
    }

    fn k_for_window(window: &[Bar], close: f64) -> Option<f64> {
        let mut lowest = f64::INFINITY;
        let mut highest = f64::NEG_INFINITY;
        for bar in window {
            if bar.low.is_nan() || bar.high.is_nan() {
                return None;
            }
            lowest = lowest.min(bar.low);
            highest = highest.max(bar.high);
        }

        let range = highest - lowest;
        if close.is_nan() || range == 0.0 {
            return None;
        }
        Some(100.0 * (close - lowest) / range)
    }
}
