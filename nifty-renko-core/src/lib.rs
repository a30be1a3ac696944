//! nifty-renko core: everything needed to turn daily bars into a signal.
//!
//! This crate contains the pure signal-derivation logic plus the adapters it
//! consumes:
//! - Domain types (bars, bricks, signals)
//! - Session gate with a year-keyed holiday cache and pluggable calendar sources
//! - Renko brick builder and stochastic %K oscillator
//! - Renko + stochastic decision rule
//! - Price data provider trait, Yahoo Finance adapter and bar cleaning

pub mod calendar;
pub mod data;
pub mod domain;
pub mod indicators;
pub mod strategy;

pub use calendar::{CalendarSource, HolidayCache, HolidaySource, SessionGate, SessionHours};
pub use data::{DataError, DataProvider, YahooProvider};
pub use domain::{Bar, Brick, Signal, SignalType};
pub use indicators::{build_bricks, RenkoBuilder, StochasticK};
pub use strategy::{RenkoStochStrategy, StrategyParams};
