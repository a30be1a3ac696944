//! nifty-renko runner: one scheduled invocation, end to end.
//!
//! This crate builds on `nifty-renko-core` to provide:
//! - TOML runner configuration with defaults and validation
//! - Service-account credential loading (env var, then key file)
//! - Signal stores (Firestore REST, in-memory) with duplicate suppression
//! - `run_once`: gate, fetch, decide, print, record

pub mod config;
pub mod credentials;
pub mod runner;
pub mod store;

pub use config::{ConfigError, HttpConfig, MarketConfig, RunnerConfig, StoreConfig};
pub use credentials::{CredentialError, CredentialOrigin, ServiceAccount};
pub use runner::{run_once, RunError, RunReport};
pub use store::{
    record_if_changed, FirestoreStore, MemoryStore, NewSignalRecord, SignalStore, StoreError,
    StoreOutcome,
};
