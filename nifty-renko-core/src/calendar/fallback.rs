//! Static NSE holiday table used when no calendar source is reachable.
//!
//! The table covers 2026 only. For any other year the gate still applies the
//! weekend and session-window rules, but no exchange holidays.

use super::{CalendarError, CalendarSource};
use chrono::NaiveDate;
use std::collections::BTreeSet;

const NSE_HOLIDAYS_2026: [(i32, u32, u32); 14] = [
    (2026, 1, 26),
    (2026, 3, 14),
    (2026, 3, 30),
    (2026, 4, 2),
    (2026, 4, 3),
    (2026, 4, 14),
    (2026, 5, 1),
    (2026, 8, 15),
    (2026, 8, 27),
    (2026, 10, 2),
    (2026, 10, 21),
    (2026, 11, 9),
    (2026, 11, 10),
    (2026, 11, 24),
];

pub fn holidays() -> BTreeSet<NaiveDate> {
    NSE_HOLIDAYS_2026
        .iter()
        .filter_map(|&(y, m, d)| NaiveDate::from_ymd_opt(y, m, d))
        .collect()
}

/// A calendar source that could not be set up. Every lookup fails, so the
/// gate runs on the static table.
#[derive(Debug, Clone)]
pub struct UnavailableSource {
    reason: String,
}

impl UnavailableSource {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl CalendarSource for UnavailableSource {
    fn name(&self) -> &str {
        "unavailable"
    }

    fn trading_days(&self, _year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        Err(CalendarError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::{ist, SessionGate};
    use chrono::TimeZone;

    #[test]
    fn table_is_complete() {
        let h = holidays();
        assert_eq!(h.len(), 14);
        assert!(h.contains(&NaiveDate::from_ymd_opt(2026, 1, 26).unwrap()));
        assert!(h.contains(&NaiveDate::from_ymd_opt(2026, 11, 24).unwrap()));
    }

    #[test]
    fn unavailable_source_gates_on_static_table() {
        let mut gate = SessionGate::nse(Box::new(UnavailableSource::new("no TLS backend")));
        // Friday 2026-10-02 is in the table, Monday 2026-10-05 is not
        assert!(!gate.is_market_open(ist().with_ymd_and_hms(2026, 10, 2, 11, 0, 0).unwrap()));
        assert!(gate.is_market_open(ist().with_ymd_and_hms(2026, 10, 5, 11, 0, 0).unwrap()));
        assert_eq!(
            gate.cache().source(),
            &crate::calendar::HolidaySource::Fallback {
                reason: "calendar source unavailable: no TLS backend".into()
            }
        );
    }
}
