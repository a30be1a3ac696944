//! One invocation: gate, fetch, decide, report, record.
//!
//! Entry point: `run_once()`. It is the whole program for a scheduled job;
//! the caller supplies the adapters so tests can run it offline.

use std::io::Write;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;
use tracing::info;

use nifty_renko_core::data::{clean_bars, lookback_window};
use nifty_renko_core::{DataError, DataProvider, RenkoStochStrategy, SessionGate, Signal};

use crate::config::RunnerConfig;
use crate::store::{record_if_changed, SignalStore, StoreOutcome};

/// Fatal run errors. Store failures are not here: they are reported in
/// [`RunReport::outcome`] and the run still succeeds. Config and credential
/// errors surface before a run starts.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("price data error: {0}")]
    Data(#[from] DataError),
    #[error("console output error: {0}")]
    Output(#[from] std::io::Error),
}

/// What one invocation did.
#[derive(Debug)]
pub struct RunReport {
    pub signal: Signal,
    pub market_open: bool,
    /// Bars the decision saw after cleaning (0 when the market was closed).
    pub bars_used: usize,
    pub outcome: StoreOutcome,
}

pub const BANNER_RULE: &str = "==================================================";

/// Run the strategy once and record the signal if it changed.
///
/// The price provider is only called while the market is open. A fetch
/// failure aborts the run before anything is written.
pub fn run_once(
    gate: &mut SessionGate,
    provider: &dyn DataProvider,
    strategy: &RenkoStochStrategy,
    store: &dyn SignalStore,
    config: &RunnerConfig,
    now: DateTime<FixedOffset>,
    out: &mut dyn Write,
) -> Result<RunReport, RunError> {
    let local_now = now.with_timezone(&gate.offset());
    let market_open = gate.is_market_open(local_now);
    let holidays = gate.cache();
    info!(
        %local_now,
        market_open,
        holiday_year = ?holidays.cached_year(),
        calendar_fallback = holidays.source().is_fallback(),
        "session gate"
    );

    let mut bars_used = 0;
    let signal = strategy.evaluate(market_open, local_now, || {
        let (start, end) = lookback_window(local_now.date_naive(), config.market.lookback_months)?;
        let fetched = provider.fetch(&config.market.symbol, start, end)?;
        let cleaned = clean_bars(fetched.bars);
        info!(
            provider = provider.name(),
            symbol = %config.market.symbol,
            %start,
            %end,
            kept = cleaned.bars.len(),
            dropped_void = cleaned.dropped_void,
            dropped_duplicates = cleaned.dropped_duplicates,
            "fetched bars"
        );
        bars_used = cleaned.bars.len();
        Ok::<_, DataError>(cleaned.bars)
    })?;

    write_banner(out, &signal)?;

    let outcome = record_if_changed(store, &signal, &config.store.source_tag);
    write_outcome(out, &signal, &outcome)?;

    Ok(RunReport {
        signal,
        market_open,
        bars_used,
        outcome,
    })
}

pub fn write_banner(out: &mut dyn Write, signal: &Signal) -> std::io::Result<()> {
    writeln!(out, "{BANNER_RULE}")?;
    writeln!(out, "Time: {}", signal.timestamp.format("%Y-%m-%d %H:%M:%S%.6f"))?;
    writeln!(out, "Signal: {}", signal.signal_type)?;
    writeln!(out, "Reason: {}", signal.reason)?;
    writeln!(out, "{BANNER_RULE}")
}

pub fn write_outcome(out: &mut dyn Write, signal: &Signal, outcome: &StoreOutcome) -> std::io::Result<()> {
    match outcome {
        StoreOutcome::Written => writeln!(out, "Firebase updated: {}", signal.signal_type),
        StoreOutcome::Skipped => writeln!(out, "Same signal - skipped"),
        StoreOutcome::Failed(e) => writeln!(out, "Firebase error: {e}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use nifty_renko_core::calendar::ist;
    use crate::store::StoreError;
    use nifty_renko_core::SignalType;

    fn signal() -> Signal {
        Signal {
            signal_type: SignalType::NoEntry,
            reason: "Market closed or no setup".into(),
            price: 0.0,
            stochastic: Some(0.0),
            timestamp: ist().with_ymd_and_hms(2026, 1, 10, 11, 0, 0).unwrap(),
        }
    }

    #[test]
    fn banner_layout() {
        let mut out = Vec::new();
        write_banner(&mut out, &signal()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "=".repeat(50));
        assert_eq!(lines[1], "Time: 2026-01-10 11:00:00.000000");
        assert_eq!(lines[2], "Signal: NO ENTRY");
        assert_eq!(lines[3], "Reason: Market closed or no setup");
        assert_eq!(lines[4], lines[0]);
    }

    #[test]
    fn outcome_lines() {
        let s = signal();
        let mut out = Vec::new();
        write_outcome(&mut out, &s, &StoreOutcome::Written).unwrap();
        write_outcome(&mut out, &s, &StoreOutcome::Skipped).unwrap();
        write_outcome(&mut out, &s, &StoreOutcome::Failed(StoreError::Network("reset".into())))
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Firebase updated: NO ENTRY\nSame signal - skipped\nFirebase error: store request failed: reset\n"
        );
    }
}
