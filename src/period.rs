//! # Month Context Decoding
//!
//! Tide tables are published one month per document, and nothing inside the
//! document says which month it is. The month and year come from the file
//! name instead, e.g. `sourcedata/09-25.html` is September 2025.

use crate::error::CrossingError;
use chrono::{Month, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_YEAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:^|\D)(\d{2})-(\d{2})(?:\D|$)").unwrap());

/// Year/month that every row of one document is dated against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MonthContext {
    /// 1-12
    pub month: u32,
    /// Four-digit year (2000 + YY)
    pub year: i32,
    /// Zero-padded month, e.g. "09"
    pub month_key: String,
    /// Four-digit year as text, e.g. "2025"
    pub year_key: String,
}

impl MonthContext {
    /// English month name, e.g. "September".
    pub fn month_name(&self) -> &'static str {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| Month::try_from(m).ok())
            .map(|m| m.name())
            .unwrap_or("Unknown")
    }

    /// Human label used in the dataset metadata, e.g. "September 2025".
    pub fn label(&self) -> String {
        format!("{} {}", self.month_name(), self.year)
    }

    /// Calendar date for a day of this month.
    pub fn date(&self, day: u32) -> Result<NaiveDate, CrossingError> {
        NaiveDate::from_ymd_opt(self.year, self.month, day).ok_or(CrossingError::InvalidDate {
            year: self.year,
            month: self.month,
            day,
        })
    }
}

/// Derive the month context from an identifier embedding `MM-YY`.
///
/// The two digit pairs must stand alone, so `2025-09.html` is rejected rather
/// than read as month 25.
pub fn decode_month_context(identifier: &str) -> Result<MonthContext, CrossingError> {
    let caps = MONTH_YEAR_RE.captures(identifier).ok_or_else(|| {
        CrossingError::Format(format!(
            "identifier {identifier:?} must contain MM-YY (e.g. 09-25.html)"
        ))
    })?;

    let month: u32 = caps[1]
        .parse()
        .map_err(|_| CrossingError::Format(format!("bad month in {identifier:?}")))?;
    let year_short: i32 = caps[2]
        .parse()
        .map_err(|_| CrossingError::Format(format!("bad year in {identifier:?}")))?;

    if !(1..=12).contains(&month) {
        return Err(CrossingError::Format(format!(
            "month {month:02} in {identifier:?} is not between 01 and 12"
        )));
    }

    let year = 2000 + year_short;
    Ok(MonthContext {
        month,
        year,
        month_key: caps[1].to_string(),
        year_key: year.to_string(),
    })
}

/// `"1st"` -> 1, `"22nd"` -> 22. No range check here: an impossible day is
/// rejected later when the calendar date is built.
pub fn decode_ordinal_day(label: &str) -> Result<u32, CrossingError> {
    let digits: String = label.chars().filter(char::is_ascii_digit).collect();
    digits
        .parse()
        .map_err(|_| CrossingError::Format(format!("no day number in {label:?}")))
}
