//! Signal store and duplicate suppression.
//!
//! The store is an append-only log of signal records. A record is appended
//! only when the new signal type differs from the type of the latest record
//! (or the log is empty), so consecutive identical signals produce one write.
//!
//! The read-then-write in [`record_if_changed`] is not atomic. Two runs that
//! overlap can both observe the same latest record and both append; callers
//! must not run concurrently against the same collection.

pub mod firestore;
pub mod memory;

pub use firestore::FirestoreStore;
pub use memory::{MemoryStore, StoredSignal};

use nifty_renko_core::{Signal, SignalType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store authentication failed: {0}")]
    Auth(String),

    #[error("store request failed: {0}")]
    Network(String),

    #[error("store answered HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected store response: {0}")]
    Response(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// A record about to be appended. The store assigns the timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSignalRecord {
    #[serde(rename = "type")]
    pub signal_type: SignalType,
    pub price: f64,
    pub stochastics: Option<f64>,
    pub reason: String,
    pub source: String,
}

impl NewSignalRecord {
    pub fn from_signal(signal: &Signal, source: &str) -> Self {
        Self {
            signal_type: signal.signal_type,
            price: signal.price,
            stochastics: signal.stochastic,
            reason: signal.reason.clone(),
            source: source.to_string(),
        }
    }
}

/// Append-only signal log.
pub trait SignalStore: Send + Sync {
    fn name(&self) -> &str;

    /// Type of the most recent record by timestamp, `None` when the log is
    /// empty. A latest record whose type is not a known wire string is
    /// reported as `None`.
    fn latest_type(&self) -> Result<Option<SignalType>, StoreError>;

    fn append(&self, record: &NewSignalRecord) -> Result<(), StoreError>;
}

/// Result of one duplicate-suppressed write.
#[derive(Debug)]
pub enum StoreOutcome {
    Written,
    Skipped,
    Failed(StoreError),
}

impl StoreOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Append `signal` unless the latest persisted type is the same.
///
/// Errors never escape: they come back as [`StoreOutcome::Failed`].
pub fn record_if_changed(store: &dyn SignalStore, signal: &Signal, source: &str) -> StoreOutcome {
    let latest = match store.latest_type() {
        Ok(latest) => latest,
        Err(e) => {
            warn!(store = store.name(), error = %e, "reading latest signal failed");
            return StoreOutcome::Failed(e);
        }
    };

    if latest == Some(signal.signal_type) {
        info!(store = store.name(), signal = %signal.signal_type, "same signal, skipped");
        return StoreOutcome::Skipped;
    }

    let record = NewSignalRecord::from_signal(signal, source);
    match store.append(&record) {
        Ok(()) => {
            info!(
                store = store.name(),
                signal = %signal.signal_type,
                previous = ?latest,
                "signal recorded"
            );
            StoreOutcome::Written
        }
        Err(e) => {
            warn!(store = store.name(), error = %e, "appending signal failed");
            StoreOutcome::Failed(e)
        }
    }
}
