//! # Clock Time Utilities
//!
//! Conversions between `HH:MM` strings, minutes since midnight and the
//! 12-hour `H:MM:SS AM` format used by the solar data service.
//!
//! All arithmetic is done in whole minutes on a 1440-minute day. Values that
//! leave the day (a midpoint past midnight, a departure before midnight) wrap
//! back into `[0, 1440)` rather than failing.

use crate::error::CrossingError;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr, sync::LazyLock};
use tracing::{debug, warn};

pub const MINUTES_PER_DAY: u32 = 24 * 60;

static TWELVE_HOUR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d{1,2}):(\d{2}):(\d{2})\s*(AM|PM)").unwrap());

/// A wall-clock time with minute resolution.
///
/// Ordering follows the clock, which for zero-padded `HH:MM` strings is the
/// same as lexical ordering.
///
/// ```
/// use crossing_lib::time::ClockTime;
///
/// let t: ClockTime = "07:45".parse().unwrap();
/// assert_eq!(t.minutes(), 465);
/// assert_eq!(t.to_string(), "07:45");
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(u16);

impl ClockTime {
    /// Build from any minute count, wrapping into a single day.
    pub fn from_minutes(minutes: i64) -> Self {
        ClockTime(minutes.rem_euclid(MINUTES_PER_DAY as i64) as u16)
    }

    /// Minutes since midnight, `0..1440`.
    pub fn minutes(self) -> u32 {
        self.0 as u32
    }

    /// Shift by a signed number of minutes, wrapping around midnight.
    pub fn offset(self, minutes: i64) -> Self {
        Self::from_minutes(self.0 as i64 + minutes)
    }
}

impl FromStr for ClockTime {
    type Err = CrossingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time_to_minutes(s).map(|m| ClockTime(m as u16))
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for ClockTime {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ClockTime {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parse `HH:MM` (or `H:MM`) into minutes since midnight.
pub fn time_to_minutes(time: &str) -> Result<u32, CrossingError> {
    let bad = || CrossingError::Format(format!("expected HH:MM clock time, got {time:?}"));

    let (hours, minutes) = time.split_once(':').ok_or_else(bad)?;
    let all_digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !all_digits(hours) || !all_digits(minutes) {
        return Err(bad());
    }
    let hours: u32 = hours.parse().map_err(|_| bad())?;
    let minutes: u32 = minutes.parse().map_err(|_| bad())?;

    if hours >= 24 || minutes >= 60 {
        return Err(bad());
    }
    Ok(hours * 60 + minutes)
}

/// Format a minute count as zero-padded `HH:MM`, wrapping modulo one day.
pub fn minutes_to_time(minutes: i64) -> String {
    ClockTime::from_minutes(minutes).to_string()
}

/// Convert `"5:14:04 PM"` to `"17:14"`.
///
/// Seconds are dropped, not rounded. Input that doesn't look like a 12-hour
/// time is returned unchanged; if it isn't a valid `HH:MM` either, a warning
/// is logged so format drift upstream is visible.
pub fn convert_twelve_hour_to_twenty_four(time: &str) -> String {
    let Some(caps) = TWELVE_HOUR_RE.captures(time) else {
        if time_to_minutes(time).is_ok() {
            debug!(time, "time already in 24-hour form");
        } else {
            warn!(time, "unrecognised time format, passing through unchanged");
        }
        return time.to_string();
    };

    let hours: u32 = match caps[1].parse() {
        Ok(h) if (1..=12).contains(&h) => h,
        _ => {
            warn!(time, "12-hour time with out-of-range hour, passing through unchanged");
            return time.to_string();
        }
    };

    let hours = match (&caps[4], hours) {
        ("AM", 12) => 0,
        ("PM", 12) => 12,
        ("PM", h) => h + 12,
        (_, h) => h,
    };

    format!("{:02}:{}", hours, &caps[2])
}

/// Temporal centre of `[start, end]`.
///
/// When the window crosses midnight the end is taken on the following day.
/// A half-minute result is truncated, so 23:00-07:45 gives 03:22.
pub fn midpoint(start: ClockTime, end: ClockTime, crosses_midnight: bool) -> ClockTime {
    let start_mins = start.minutes();
    let mut end_mins = end.minutes();
    if crosses_midnight {
        end_mins += MINUTES_PER_DAY;
    }
    ClockTime::from_minutes(((start_mins + end_mins) / 2) as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn t(s: &str) -> ClockTime {
        s.parse().unwrap()
    }

    #[test]
    fn parses_clock_times() {
        assert_eq!(time_to_minutes("00:00").unwrap(), 0);
        assert_eq!(time_to_minutes("07:45").unwrap(), 465);
        assert_eq!(time_to_minutes("7:45").unwrap(), 465);
        assert_eq!(time_to_minutes("23:59").unwrap(), 1439);
    }

    #[test]
    fn rejects_malformed_clock_times() {
        for bad in ["", "0745", "07:45:00", "ab:cd", "24:00", "12:60", "-1:30", "+7:45", "7:+5", " 7:45", ":45"] {
            assert!(
                matches!(time_to_minutes(bad), Err(CrossingError::Format(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn formats_and_wraps_minutes() {
        assert_eq!(minutes_to_time(0), "00:00");
        assert_eq!(minutes_to_time(465), "07:45");
        assert_eq!(minutes_to_time(1440 + 202), "03:22");
        assert_eq!(minutes_to_time(-30), "23:30");
    }

    #[test]
    fn converts_twelve_hour_times() {
        assert_eq!(convert_twelve_hour_to_twenty_four("12:00:00 AM"), "00:00");
        assert_eq!(convert_twelve_hour_to_twenty_four("12:00:00 PM"), "12:00");
        assert_eq!(convert_twelve_hour_to_twenty_four("5:14:04 AM"), "05:14");
        assert_eq!(convert_twelve_hour_to_twenty_four("5:14:04 PM"), "17:14");
        assert_eq!(convert_twelve_hour_to_twenty_four("11:59:59 PM"), "23:59");
    }

    #[test]
    fn twelve_hour_conversion_passes_unknown_input_through() {
        assert_eq!(convert_twelve_hour_to_twenty_four("06:30"), "06:30");
        assert_eq!(convert_twelve_hour_to_twenty_four("11:58:47"), "11:58:47");
        assert_eq!(convert_twelve_hour_to_twenty_four("13:00:00 PM"), "13:00:00 PM");
    }

    #[test]
    fn midpoint_of_same_day_window() {
        assert_eq!(midpoint(t("11:05"), t("19:15"), false), t("15:10"));
    }

    #[test]
    fn midpoint_across_midnight_truncates_half_minute() {
        // (1380 + 465 + 1440) / 2 = 1642.5
        assert_eq!(midpoint(t("23:00"), t("07:45"), true), t("03:22"));
        // (600 + 601) / 2 = 600.5
        assert_eq!(midpoint(t("10:00"), t("10:01"), false), t("10:00"));
    }

    #[test]
    fn clock_time_serializes_as_string() {
        let json = serde_json::to_string(&t("05:07")).unwrap();
        assert_eq!(json, "\"05:07\"");
        let back: ClockTime = serde_json::from_str(&json).unwrap();
        assert_eq!(back, t("05:07"));
        assert!(serde_json::from_str::<ClockTime>("\"25:00\"").is_err());
    }

    proptest! {
        #[test]
        fn minutes_round_trip_through_text(h in 0u32..24, m in 0u32..60) {
            let text = format!("{h:02}:{m:02}");
            let mins = time_to_minutes(&text).unwrap();
            prop_assert_eq!(minutes_to_time(mins as i64), text);
        }
    }
}
