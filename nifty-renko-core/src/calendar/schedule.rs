//! Offline calendar sources: a CSV trading schedule and an in-memory set.

use super::{CalendarError, CalendarSource};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct ScheduleRow {
    date: String,
}

/// Trading schedule read from a CSV file with a `date` column (`YYYY-MM-DD`).
///
/// The file is re-read on every lookup; the gate's cache keeps that to once
/// per year.
#[derive(Debug, Clone)]
pub struct CsvScheduleSource {
    path: PathBuf,
}

impl CsvScheduleSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        let mut reader = csv::Reader::from_path(&self.path)?;
        let mut days = BTreeSet::new();
        for row in reader.deserialize() {
            let row: ScheduleRow = row?;
            let date = NaiveDate::parse_from_str(row.date.trim(), "%Y-%m-%d").map_err(|e| {
                CalendarError::Parse(format!("{}: bad date {:?}: {e}", self.path.display(), row.date))
            })?;
            days.insert(date);
        }
        Ok(days)
    }
}

impl CalendarSource for CsvScheduleSource {
    fn name(&self) -> &str {
        "csv_schedule"
    }

    fn trading_days(&self, year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        let days: BTreeSet<NaiveDate> = self
            .read_all()?
            .into_iter()
            .filter(|d| d.year() == year)
            .collect();
        if days.is_empty() {
            return Err(CalendarError::NoSessions { year });
        }
        Ok(days)
    }
}

/// Fixed set of trading days, mostly for tests and replays.
#[derive(Debug, Clone, Default)]
pub struct StaticSchedule {
    days: BTreeSet<NaiveDate>,
}

impl StaticSchedule {
    pub fn new(days: BTreeSet<NaiveDate>) -> Self {
        Self { days }
    }
}

impl FromIterator<NaiveDate> for StaticSchedule {
    fn from_iter<I: IntoIterator<Item = NaiveDate>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}

impl CalendarSource for StaticSchedule {
    fn name(&self) -> &str {
        "static_schedule"
    }

    fn trading_days(&self, year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        let days: BTreeSet<NaiveDate> =
            self.days.iter().filter(|d| d.year() == year).copied().collect();
        if days.is_empty() {
            return Err(CalendarError::NoSessions { year });
        }
        Ok(days)
    }
}
