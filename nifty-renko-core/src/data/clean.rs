//! Bar cleaning: drop incomplete rows, sort, dedupe.
//!
//! After cleaning, the series satisfies the bar invariants the indicators rely
//! on: strictly ascending dates and no NaN in any OHLC field.

use crate::domain::Bar;

/// Outcome of cleaning a raw fetch.
#[derive(Debug, Clone)]
pub struct CleanedBars {
    pub bars: Vec<Bar>,
    /// Rows dropped because an OHLC value was missing.
    pub dropped_void: usize,
    /// Rows dropped because an earlier row had the same date.
    pub dropped_duplicates: usize,
}

/// Drop void rows, sort ascending by date and keep the first row per date.
pub fn clean_bars(raw: Vec<Bar>) -> CleanedBars {
    let total = raw.len();
    let mut bars: Vec<Bar> = raw.into_iter().filter(|b| !b.is_void()).collect();
    let dropped_void = total - bars.len();

    // Stable sort keeps provider order among equal dates, so dedup keeps the first.
    bars.sort_by_key(|b| b.date);
    let before_dedup = bars.len();
    bars.dedup_by_key(|b| b.date);

    CleanedBars {
        dropped_duplicates: before_dedup - bars.len(),
        bars,
        dropped_void,
    }
}
