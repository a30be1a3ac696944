//! In-memory signal log for dry runs and tests.

use super::{NewSignalRecord, SignalStore, StoreError};
use chrono::{DateTime, Duration, Utc};
use nifty_renko_core::SignalType;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredSignal {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub record: NewSignalRecord,
}

/// Append-only `Vec` of records with strictly increasing timestamps.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<Vec<StoredSignal>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose log already holds one record of `signal_type`.
    pub fn with_latest(signal_type: SignalType) -> Self {
        let store = Self::new();
        store.push(NewSignalRecord {
            signal_type,
            price: 0.0,
            stochastics: Some(0.0),
            reason: "seed".to_string(),
            source: "seed".to_string(),
        });
        store
    }

    pub fn records(&self) -> Vec<StoredSignal> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<StoredSignal>> {
        self.records.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn push(&self, record: NewSignalRecord) {
        let mut records = self.lock();
        let now = Utc::now();
        let timestamp = match records.last() {
            Some(last) if last.timestamp >= now => last.timestamp + Duration::microseconds(1),
            _ => now,
        };
        records.push(StoredSignal {
            id: uuid::Uuid::new_v4().simple().to_string(),
            timestamp,
            record,
        });
    }
}

impl SignalStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    fn latest_type(&self) -> Result<Option<SignalType>, StoreError> {
        Ok(self
            .lock()
            .iter()
            .max_by_key(|s| s.timestamp)
            .map(|s| s.record.signal_type))
    }

    fn append(&self, record: &NewSignalRecord) -> Result<(), StoreError> {
        self.push(record.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(signal_type: SignalType) -> NewSignalRecord {
        NewSignalRecord {
            signal_type,
            price: 1.0,
            stochastics: None,
            reason: "r".into(),
            source: "s".into(),
        }
    }

    #[test]
    fn empty_store_has_no_latest() {
        let store = MemoryStore::new();
        assert!(store.is_empty());
        assert_eq!(store.latest_type().unwrap(), None);
    }

    #[test]
    fn timestamps_strictly_increase() {
        let store = MemoryStore::new();
        for _ in 0..50 {
            store.append(&record(SignalType::Buy)).unwrap();
        }
        let records = store.records();
        assert!(records.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }

    #[test]
    fn latest_follows_last_append() {
        let store = MemoryStore::with_latest(SignalType::Sell);
        assert_eq!(store.latest_type().unwrap(), Some(SignalType::Sell));
        store.append(&record(SignalType::NoEntry)).unwrap();
        assert_eq!(store.latest_type().unwrap(), Some(SignalType::NoEntry));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ids_are_unique() {
        let store = MemoryStore::new();
        store.append(&record(SignalType::Buy)).unwrap();
        store.append(&record(SignalType::Sell)).unwrap();
        let records = store.records();
        assert_ne!(records[0].id, records[1].id);
    }
}
