//! Renko + stochastic decision rule.
//!
//! BUY when the last three bricks are up and %K crosses the oversold level
//! from below; SELL when the last three bricks are down and %K crosses the
//! overbought level from above; NO ENTRY otherwise.
//!
//! The rule receives bar history only. It never sees the signal store, so the
//! decision cannot depend on what was persisted before.

use crate::domain::{Bar, Brick, Signal, SignalType};
use crate::indicators::{build_bricks, IndicatorError, StochasticK};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const REASON_DEFAULT: &str = "Market closed or no setup";
pub const REASON_BUY: &str = "Renko bullish + Stoch up";
pub const REASON_SELL: &str = "Renko bearish + Stoch down";
pub const REASON_NO_SETUP: &str = "Setup not complete";

/// Tunable parameters of the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StrategyParams {
    pub brick_size: f64,
    pub stoch_period: usize,
    /// Bars required before the rule evaluates anything.
    pub min_bars: usize,
    pub oversold: f64,
    pub overbought: f64,
}

impl Default for StrategyParams {
    fn default() -> Self {
        Self {
            brick_size: 20.0,
            stoch_period: 14,
            min_bars: 20,
            oversold: 20.0,
            overbought: 80.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenkoStochStrategy {
    params: StrategyParams,
    stoch: StochasticK,
}

impl Default for RenkoStochStrategy {
    fn default() -> Self {
        Self::new(StrategyParams::default()).expect("default strategy params are valid")
    }
}

impl RenkoStochStrategy {
    /// Fails when `stoch_period` is zero. An unusable brick size is not
    /// rejected here: `decide` then reports the default reason.
    pub fn new(params: StrategyParams) -> Result<Self, IndicatorError> {
        let stoch = StochasticK::new(params.stoch_period)?;
        Ok(Self { params, stoch })
    }

    /// The signal reported when the market is closed or nothing was evaluated.
    pub fn default_signal(timestamp: DateTime<FixedOffset>) -> Signal {
        Signal {
            signal_type: SignalType::NoEntry,
            reason: REASON_DEFAULT.to_string(),
            price: 0.0,
            stochastic: Some(0.0),
            timestamp,
        }
    }

    /// Gate-aware entry point. When the market is closed `fetch` is never
    /// called and the default signal is returned.
    pub fn evaluate<F, E>(
        &self,
        market_open: bool,
        timestamp: DateTime<FixedOffset>,
        fetch: F,
    ) -> Result<Signal, E>
    where
        F: FnOnce() -> Result<Vec<Bar>, E>,
    {
        if !market_open {
            debug!("market closed, skipping evaluation");
            return Ok(Self::default_signal(timestamp));
        }
        let bars = fetch()?;
        Ok(self.decide(&bars, timestamp))
    }

    /// Decide on the bar history. Pure: the same bars and timestamp always
    /// give the same signal.
    pub fn decide(&self, bars: &[Bar], timestamp: DateTime<FixedOffset>) -> Signal {
        let mut signal = Self::default_signal(timestamp);

        if bars.len() < self.params.min_bars.max(2) {
            debug!(
                bars = bars.len(),
                min_bars = self.params.min_bars,
                "not enough history"
            );
            return signal;
        }

        let k = self.stoch.compute(bars);
        let last = bars.len() - 1;
        let current_k = k[last];
        let previous_k = k[last - 1];

        signal.price = bars[last].close;
        signal.stochastic = current_k;

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let bricks = match build_bricks(&closes, self.params.brick_size) {
            Ok(bricks) => bricks,
            Err(e) => {
                warn!(error = %e, "renko build failed");
                return signal;
            }
        };

        if bricks.len() < 3 {
            debug!(bricks = bricks.len(), "fewer than three bricks");
            return signal;
        }

        let tail = &bricks[bricks.len() - 3..];
        let three_green = tail.iter().all(|b| *b == Brick::Up);
        let three_red = tail.iter().all(|b| *b == Brick::Down);

        let crossed_up = matches!(
            (previous_k, current_k),
            (Some(prev), Some(cur)) if prev <= self.params.oversold && cur > self.params.oversold
        );
        let crossed_down = matches!(
            (previous_k, current_k),
            (Some(prev), Some(cur)) if prev >= self.params.overbought && cur < self.params.overbought
        );

        let (signal_type, reason) = if three_green && crossed_up {
            (SignalType::Buy, REASON_BUY)
        } else if three_red && crossed_down {
            (SignalType::Sell, REASON_SELL)
        } else {
            (SignalType::NoEntry, REASON_NO_SETUP)
        };
        signal.signal_type = signal_type;
        signal.reason = reason.to_string();

        info!(
            signal = %signal.signal_type,
            reason = %signal.reason,
            price = signal.price,
            k = ?signal.stochastic,
            bricks = bricks.len(),
            "decision"
        );
        signal
    }
}
