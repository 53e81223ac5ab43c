//! # Causeway Crossing Core Library
//!
//! Turns the council's monthly HTML tide tables into a JSON dataset of safe
//! crossing windows, one entry per calendar date, each window enriched with
//! sunrise/sunset data so a planner can tell whether a crossing happens in
//! daylight.
//!
//! ## Data Flow
//! 1. **Decode**: month and year come from the file name ([`period`])
//! 2. **Extract**: table rows become [`SourcePeriod`]s, midnight crossings
//!    resolved to a start/end date pair ([`extract`])
//! 3. **Filter**: only SAFE periods starting on the row's own date survive
//! 4. **Enrich**: one solar lookup per distinct date, cached for the run ([`solar`])
//! 5. **Aggregate**: per-file results merged by date and written out ([`aggregate`])
//!
//! ## Core Types
//! - [`SourcePeriod`]: one labelled interval straight out of a table cell
//! - [`CrossingWindow`]: a SAFE period plus midpoint, daylight flag and solar data
//! - [`TideDataset`]: the persisted artifact

use crate::time::ClockTime;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// Module declarations
pub mod aggregate;
pub mod config;
pub mod error;
pub mod extract;
pub mod period;
pub mod planner;
pub mod solar;
pub mod time;

pub use error::CrossingError;

/// Safety classification the source table attaches to a cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Safe,
    Unsafe,
}

/// One contiguous labelled interval extracted from a table cell.
///
/// `end_date` equals `start_date` unless the interval crosses midnight, in
/// which case it is the following day.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePeriod {
    #[serde(rename = "type")]
    pub classification: Classification,
    pub start: ClockTime,
    pub end: ClockTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl SourcePeriod {
    pub fn is_safe(&self) -> bool {
        self.classification == Classification::Safe
    }

    pub fn crosses_midnight(&self) -> bool {
        self.end_date != self.start_date
    }
}

/// One date's solar facts, all times 24-hour `HH:MM`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarData {
    pub sunrise: String,
    pub sunset: String,
    pub dawn: String,
    pub dusk: String,
    pub solar_noon: String,
    /// "sunrise-goldenHour"
    pub golden_hour_morning: String,
    /// "goldenHour-sunset"
    pub golden_hour_evening: String,
    pub day_length: String,
}

impl SolarData {
    /// True if `time` falls within `[sunrise, sunset]`, bounds inclusive.
    ///
    /// Unparseable sunrise/sunset (upstream format drift) counts as dark.
    pub fn is_daylight(&self, time: ClockTime) -> bool {
        match (
            self.sunrise.parse::<ClockTime>(),
            self.sunset.parse::<ClockTime>(),
        ) {
            (Ok(sunrise), Ok(sunset)) => sunrise <= time && time <= sunset,
            _ => false,
        }
    }
}

/// A SAFE period with its derived and enriched fields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossingWindow {
    #[serde(rename = "type")]
    pub classification: Classification,
    pub start: ClockTime,
    pub end: ClockTime,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub midpoint: ClockTime,
    pub daylight: bool,
    /// Solar data for `start_date`, `None` when the lookup failed
    pub photography: Option<SolarData>,
}

impl CrossingWindow {
    /// Derive midpoint and daylight flag for a period.
    ///
    /// # Example
    /// ```
    /// use chrono::NaiveDate;
    /// use crossing_lib::{Classification, CrossingWindow, SourcePeriod};
    ///
    /// let day = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
    /// let period = SourcePeriod {
    ///     classification: Classification::Safe,
    ///     start: "23:00".parse().unwrap(),
    ///     end: "07:45".parse().unwrap(),
    ///     start_date: day,
    ///     end_date: day.succ_opt().unwrap(),
    /// };
    ///
    /// let window = CrossingWindow::new(period, None);
    /// assert_eq!(window.midpoint.to_string(), "03:22");
    /// assert!(!window.daylight);
    /// ```
    pub fn new(period: SourcePeriod, solar: Option<SolarData>) -> Self {
        let midpoint = time::midpoint(period.start, period.end, period.crosses_midnight());
        let daylight = solar.as_ref().is_some_and(|s| s.is_daylight(midpoint));

        CrossingWindow {
            classification: period.classification,
            start: period.start,
            end: period.end,
            start_date: period.start_date,
            end_date: period.end_date,
            midpoint,
            daylight,
            photography: solar,
        }
    }
}

/// Filtered SAFE periods keyed by the date they start on.
pub type DayPeriods = BTreeMap<NaiveDate, Vec<SourcePeriod>>;

/// Enriched crossing windows keyed by the date they start on.
pub type DayWindows = BTreeMap<NaiveDate, Vec<CrossingWindow>>;

/// The persisted artifact.
///
/// Single-file runs fill `month`; directory runs fill `months` and
/// `total_days`. Consumers look windows up by date key; the sorted key order
/// is only for readability.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TideDataset {
    /// RFC 3339 UTC generation time
    pub last_updated: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub months: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_days: Option<usize>,
    pub data: DayWindows,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar(sunrise: &str, sunset: &str) -> SolarData {
        SolarData {
            sunrise: sunrise.into(),
            sunset: sunset.into(),
            dawn: "05:59".into(),
            dusk: "20:12".into(),
            solar_noon: "13:06".into(),
            golden_hour_morning: format!("{sunrise}-07:10"),
            golden_hour_evening: format!("18:59-{sunset}"),
            day_length: "13:05:12".into(),
        }
    }

    fn period(start: &str, end: &str, next_day: bool) -> SourcePeriod {
        let day = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
        SourcePeriod {
            classification: Classification::Safe,
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            start_date: day,
            end_date: if next_day { day.succ_opt().unwrap() } else { day },
        }
    }

    #[test]
    fn daylight_bounds_are_inclusive() {
        let s = solar("06:33", "19:38");
        assert!(s.is_daylight("06:33".parse().unwrap()));
        assert!(s.is_daylight("19:38".parse().unwrap()));
        assert!(!s.is_daylight("06:32".parse().unwrap()));
        assert!(!s.is_daylight("19:39".parse().unwrap()));
    }

    #[test]
    fn window_without_solar_data_is_not_daylight() {
        let window = CrossingWindow::new(period("11:05", "19:15", false), None);
        assert_eq!(window.midpoint.to_string(), "15:10");
        assert!(!window.daylight);
        assert!(window.photography.is_none());
    }

    #[test]
    fn window_daylight_uses_midpoint() {
        let s = solar("06:33", "19:38");
        let day = CrossingWindow::new(period("11:05", "19:15", false), Some(s.clone()));
        assert!(day.daylight);

        let night = CrossingWindow::new(period("23:00", "07:45", true), Some(s));
        assert_eq!(night.midpoint.to_string(), "03:22");
        assert!(!night.daylight);
    }

    #[test]
    fn window_serializes_with_wire_names() {
        let window = CrossingWindow::new(period("23:00", "07:45", true), None);
        let json = serde_json::to_value(&window).unwrap();
        assert_eq!(json["type"], "safe");
        assert_eq!(json["start"], "23:00");
        assert_eq!(json["end"], "07:45");
        assert_eq!(json["startDate"], "2025-09-05");
        assert_eq!(json["endDate"], "2025-09-06");
        assert_eq!(json["midpoint"], "03:22");
        assert_eq!(json["daylight"], false);
        assert!(json["photography"].is_null());
    }

    #[test]
    fn single_month_dataset_omits_directory_fields() {
        let dataset = TideDataset {
            last_updated: "2025-09-01T00:00:00.000Z".into(),
            source: "test".into(),
            month: Some("September 2025".into()),
            months: None,
            total_days: None,
            data: DayWindows::new(),
        };
        let json = serde_json::to_value(&dataset).unwrap();
        assert_eq!(json["lastUpdated"], "2025-09-01T00:00:00.000Z");
        assert_eq!(json["month"], "September 2025");
        assert!(json.get("months").is_none());
        assert!(json.get("totalDays").is_none());
    }
}
