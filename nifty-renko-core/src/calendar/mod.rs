//! Session gate: is the market open right now?
//!
//! The gate is closed on weekends, on exchange holidays and outside the
//! configured session window (09:17:00 to 15:30:00 IST by default, both ends
//! inclusive).
//!
//! Holidays are derived from a [`CalendarSource`]: every Monday to Friday of the
//! year that the source does not list as a trading day. When the source fails
//! the static [`fallback`] table is used instead; the failure is logged and
//! never reaches the caller. The derived (or fallback) list is cached per
//! calendar year.

pub mod fallback;
pub mod nse;
pub mod schedule;

pub use fallback::UnavailableSource;
pub use nse::NseHolidaySource;
pub use schedule::{CsvScheduleSource, StaticSchedule};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike, Weekday};
use std::collections::BTreeSet;
use thiserror::Error;
use tracing::{debug, info, warn};

/// India Standard Time, UTC+05:30.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// The IST offset as a chrono value.
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("IST offset is within a day")
}

/// Errors from calendar sources. Only ever seen by the gate, which falls back.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("calendar request failed: {0}")]
    Network(String),

    #[error("calendar source answered HTTP {status}")]
    Http { status: u16 },

    #[error("calendar response malformed: {0}")]
    Parse(String),

    #[error("calendar file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("calendar csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("no trading sessions published for {year}")]
    NoSessions { year: i32 },

    #[error("calendar source unavailable: {0}")]
    Unavailable(String),
}

/// A source of the exchange trading schedule.
pub trait CalendarSource: Send + Sync {
    fn name(&self) -> &str;

    /// All trading days of `year`.
    fn trading_days(&self, year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError>;
}

/// Every Monday to Friday of `year` that is not a trading day.
pub fn derive_holidays(year: i32, trading_days: &BTreeSet<NaiveDate>) -> BTreeSet<NaiveDate> {
    weekdays_of(year)
        .filter(|d| !trading_days.contains(d))
        .collect()
}

/// Iterate over the Monday to Friday dates of `year`.
pub fn weekdays_of(year: i32) -> impl Iterator<Item = NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, 1, 1);
    first
        .into_iter()
        .flat_map(|d| d.iter_days())
        .take_while(move |d| d.year() == year)
        .filter(|d| !is_weekend(*d))
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Where the current holiday list came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidaySource {
    /// Nothing loaded yet.
    Empty,
    /// Derived from a calendar source for the cached year.
    Derived { source: String },
    /// Static fallback table, used because the source failed.
    Fallback { reason: String },
}

impl HolidaySource {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

/// Year-keyed holiday cache. A fallback list is cached like a derived one;
/// the source is asked again only when the year changes.
#[derive(Debug, Clone)]
pub struct HolidayCache {
    year: Option<i32>,
    holidays: BTreeSet<NaiveDate>,
    source: HolidaySource,
}

impl Default for HolidayCache {
    fn default() -> Self {
        Self::new()
    }
}

impl HolidayCache {
    pub fn new() -> Self {
        Self {
            year: None,
            holidays: BTreeSet::new(),
            source: HolidaySource::Empty,
        }
    }

    /// Year of the cached list, if any.
    pub fn cached_year(&self) -> Option<i32> {
        self.year
    }

    pub fn source(&self) -> &HolidaySource {
        &self.source
    }

    /// Holidays for `year`, refreshing from `source` unless already cached.
    pub fn holidays_for(&mut self, year: i32, source: &dyn CalendarSource) -> &BTreeSet<NaiveDate> {
        if self.year != Some(year) {
            self.refresh(year, source);
        }
        &self.holidays
    }

    /// Rebuild the holiday list for `year` from `source`, falling back to the
    /// static table on any source error.
    pub fn refresh(&mut self, year: i32, source: &dyn CalendarSource) -> &HolidaySource {
        match source.trading_days(year) {
            Ok(trading_days) => {
                self.holidays = derive_holidays(year, &trading_days);
                self.year = Some(year);
                self.source = HolidaySource::Derived {
                    source: source.name().to_string(),
                };
                info!(
                    source = source.name(),
                    year,
                    holidays = self.holidays.len(),
                    "derived exchange holidays"
                );
            }
            Err(e) => {
                warn!(
                    source = source.name(),
                    year,
                    error = %e,
                    "calendar source failed, using static holiday table"
                );
                self.holidays = fallback::holidays();
                self.year = Some(year);
                self.source = HolidaySource::Fallback {
                    reason: e.to_string(),
                };
            }
        }
        &self.source
    }
}

/// Daily session window in market-local time, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionHours {
    pub open: NaiveTime,
    pub close: NaiveTime,
}

impl SessionHours {
    /// NSE cash session as gated by the strategy: 09:17:00 to 15:30:00.
    pub fn nse() -> Self {
        Self {
            open: NaiveTime::from_hms_opt(9, 17, 0).expect("valid session open"),
            close: NaiveTime::from_hms_opt(15, 30, 0).expect("valid session close"),
        }
    }

    /// Whether `time` falls inside the window. Sub-second precision is ignored,
    /// so 15:30:00.9 still counts as open.
    pub fn contains(&self, time: NaiveTime) -> bool {
        let time = time.with_nanosecond(0).unwrap_or(time);
        self.open <= time && time <= self.close
    }
}

impl Default for SessionHours {
    fn default() -> Self {
        Self::nse()
    }
}

/// The calendar gate: clock + holidays + session window.
pub struct SessionGate {
    hours: SessionHours,
    offset: FixedOffset,
    source: Box<dyn CalendarSource>,
    cache: HolidayCache,
}

impl SessionGate {
    pub fn new(hours: SessionHours, offset: FixedOffset, source: Box<dyn CalendarSource>) -> Self {
        Self {
            hours,
            offset,
            source,
            cache: HolidayCache::new(),
        }
    }

    /// Gate for NSE: IST offset and the default session window.
    pub fn nse(source: Box<dyn CalendarSource>) -> Self {
        Self::new(SessionHours::nse(), ist(), source)
    }

    pub fn cache(&self) -> &HolidayCache {
        &self.cache
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Is the market open at `now`? `now` may be in any offset; it is
    /// converted to market-local time first.
    pub fn is_market_open(&mut self, now: DateTime<FixedOffset>) -> bool {
        let local = now.with_timezone(&self.offset);
        let date = local.date_naive();

        if is_weekend(date) {
            debug!(%date, "closed: weekend");
            return false;
        }

        if self.cache.holidays_for(date.year(), self.source.as_ref()).contains(&date) {
            debug!(%date, "closed: exchange holiday");
            return false;
        }

        let open = self.hours.contains(local.time());
        debug!(time = %local.time(), open, "session window check");
        open
    }
}
