//! nifty-renko CLI: compute the NIFTY Renko + stochastic signal once.
//!
//! Meant to be run on a schedule (every few minutes during the session).
//! With no flags it gates on the NSE calendar, fetches `^NSEI` from Yahoo
//! Finance, prints the signal and records it in Firestore if it changed.
//!
//! Exit status is non-zero only when the run cannot complete: bad config,
//! missing credentials or a failed price fetch. A failed store write is
//! printed and the run still succeeds.

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, Utc};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn, Level};

use nifty_renko_core::calendar::{CsvScheduleSource, NseHolidaySource, UnavailableSource};
use nifty_renko_core::{CalendarSource, RenkoStochStrategy, SessionGate, YahooProvider};
use nifty_renko_runner::{
    run_once, FirestoreStore, MemoryStore, RunnerConfig, ServiceAccount, SignalStore,
};

#[derive(Parser)]
#[command(
    name = "nifty-renko",
    about = "NIFTY Renko + stochastic signal: run once and record changes"
)]
struct Cli {
    /// Path to a TOML config file. Built-in defaults when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record into an in-memory store instead of Firestore (no credentials needed).
    #[arg(long, default_value_t = false)]
    dry_run: bool,

    /// CSV trading schedule (`date` column) to use instead of the NSE holiday API.
    #[arg(long)]
    calendar_csv: Option<PathBuf>,

    /// Override the clock, RFC 3339 (e.g. 2026-02-03T11:00:00+05:30).
    #[arg(long)]
    now: Option<String>,

    /// Debug-level logging.
    #[arg(long, short, default_value_t = false)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = match &cli.config {
        Some(path) => RunnerConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RunnerConfig::default(),
    };
    let offset = config.market.offset()?;
    let now = resolve_now(cli.now.as_deref(), offset)?;
    let timeout = config.http.timeout();

    let source: Box<dyn CalendarSource> = match &cli.calendar_csv {
        Some(path) => Box::new(CsvScheduleSource::new(path)),
        None => nse_source(timeout),
    };
    let mut gate = SessionGate::new(config.market.session_hours(), offset, source);
    let provider = YahooProvider::new(timeout)?;
    let strategy = RenkoStochStrategy::new(config.strategy.clone())?;
    let store = build_store(&cli, &config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let report = run_once(
        &mut gate,
        &provider,
        &strategy,
        store.as_ref(),
        &config,
        now,
        &mut out,
    )?;

    info!(
        signal = %report.signal.signal_type,
        market_open = report.market_open,
        bars = report.bars_used,
        store_failed = report.outcome.is_failed(),
        "run complete"
    );
    Ok(())
}

fn resolve_now(flag: Option<&str>, offset: FixedOffset) -> Result<DateTime<FixedOffset>> {
    match flag {
        Some(s) => DateTime::parse_from_rfc3339(s).with_context(|| format!("--now {s:?} is not RFC 3339")),
        None => Ok(Utc::now().with_timezone(&offset)),
    }
}

/// The NSE holiday source, or one that always fails when the HTTP client
/// cannot be built. Either way the gate falls back to the static table.
fn nse_source(timeout: Duration) -> Box<dyn CalendarSource> {
    match NseHolidaySource::new(timeout) {
        Ok(source) => Box::new(source),
        Err(e) => {
            warn!(error = %e, "NSE calendar client unavailable, using static holiday table");
            Box::new(UnavailableSource::new(e.to_string()))
        }
    }
}

fn build_store(cli: &Cli, config: &RunnerConfig) -> Result<Box<dyn SignalStore>> {
    if cli.dry_run {
        info!("dry run: recording into memory");
        return Ok(Box::new(MemoryStore::new()));
    }

    let (account, origin) =
        ServiceAccount::load(&config.store.credentials_env, &config.store.credentials_file)?;
    info!(%origin, project = %account.project_id, "loaded service account");
    let store = FirestoreStore::new(account, config.store.collection.clone(), config.http.timeout())?;
    Ok(Box::new(store))
}
