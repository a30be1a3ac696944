//! NSE holiday-master calendar source.
//!
//! NSE publishes trading holidays per market segment. The capital-market
//! segment (`CM`) is the one that applies to the index; trading days are the
//! weekdays of the year minus those holidays.

use super::{weekdays_of, CalendarError, CalendarSource};
use chrono::{Datelike, NaiveDate};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::time::Duration;

const HOLIDAY_MASTER_URL: &str = "https://www.nseindia.com/api/holiday-master?type=trading";

#[derive(Debug, Deserialize)]
struct HolidayEntry {
    #[serde(rename = "tradingDate")]
    trading_date: String,
    #[serde(default)]
    description: Option<String>,
}

pub struct NseHolidaySource {
    client: reqwest::blocking::Client,
    url: String,
    segment: String,
}

impl NseHolidaySource {
    pub fn new(timeout: Duration) -> Result<Self, CalendarError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
            .build()
            .map_err(|e| CalendarError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: HOLIDAY_MASTER_URL.to_string(),
            segment: "CM".to_string(),
        })
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Holidays of `year` for the configured segment, parsed from the raw body.
    fn parse_holidays(&self, body: &str, year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        let segments: HashMap<String, Vec<HolidayEntry>> =
            serde_json::from_str(body).map_err(|e| CalendarError::Parse(e.to_string()))?;

        let entries = segments
            .get(&self.segment)
            .ok_or_else(|| CalendarError::Parse(format!("segment {} missing", self.segment)))?;

        let mut holidays = BTreeSet::new();
        for entry in entries {
            let date = NaiveDate::parse_from_str(&entry.trading_date, "%d-%b-%Y").map_err(|e| {
                CalendarError::Parse(format!(
                    "bad tradingDate {:?} ({}): {e}",
                    entry.trading_date,
                    entry.description.as_deref().unwrap_or("no description")
                ))
            })?;
            if date.year() == year {
                holidays.insert(date);
            }
        }

        if holidays.is_empty() {
            return Err(CalendarError::NoSessions { year });
        }
        Ok(holidays)
    }
}

impl CalendarSource for NseHolidaySource {
    fn name(&self) -> &str {
        "nse_holiday_master"
    }

    fn trading_days(&self, year: i32) -> Result<BTreeSet<NaiveDate>, CalendarError> {
        let resp = self
            .client
            .get(&self.url)
            .header("Accept", "application/json")
            .send()
            .map_err(|e| CalendarError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CalendarError::Http {
                status: status.as_u16(),
            });
        }

        let body = resp
            .text()
            .map_err(|e| CalendarError::Network(e.to_string()))?;
        let holidays = self.parse_holidays(&body, year)?;

        Ok(weekdays_of(year).filter(|d| !holidays.contains(d)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "CM": [
            {"tradingDate": "26-Jan-2026", "weekDay": "Monday", "description": "Republic Day", "Sr_no": 1},
            {"tradingDate": "02-Oct-2026", "weekDay": "Friday", "description": "Gandhi Jayanti", "Sr_no": 2},
            {"tradingDate": "25-Dec-2025", "weekDay": "Thursday", "description": "Christmas", "Sr_no": 3}
        ],
        "FO": [
            {"tradingDate": "27-Jan-2026", "weekDay": "Tuesday", "description": "segment specific", "Sr_no": 1}
        ]
    }"#;

    fn source() -> NseHolidaySource {
        NseHolidaySource::new(Duration::from_secs(1)).unwrap()
    }

    #[test]
    fn parses_capital_market_segment_for_year() {
        let holidays = source().parse_holidays(BODY, 2026).unwrap();
        let expected: BTreeSet<NaiveDate> = [
            NaiveDate::from_ymd_opt(2026, 1, 26).unwrap(),
            NaiveDate::from_ymd_opt(2026, 10, 2).unwrap(),
        ]
        .into_iter()
        .collect();
        assert_eq!(holidays, expected);
    }

    #[test]
    fn year_without_entries_is_an_error() {
        let err = source().parse_holidays(BODY, 2030).unwrap_err();
        assert!(matches!(err, CalendarError::NoSessions { year: 2030 }));
    }

    #[test]
    fn malformed_date_is_a_parse_error() {
        let body = r#"{"CM": [{"tradingDate": "2026-01-26"}]}"#;
        assert!(matches!(
            source().parse_holidays(body, 2026),
            Err(CalendarError::Parse(_))
        ));
    }

    #[test]
    fn missing_segment_is_a_parse_error() {
        let body = r#"{"FO": []}"#;
        assert!(matches!(
            source().parse_holidays(body, 2026),
            Err(CalendarError::Parse(_))
        ));
    }
}
