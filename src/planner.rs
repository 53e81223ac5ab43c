//! # Crossing Planner
//!
//! Works backwards from a safe window to a walking schedule: be at the
//! causeway a fixed lead time before the window's midpoint, and set off a
//! fixed walking time (Naismith's Rule estimate) before that.

use crate::{
    config::PlannerConfig,
    error::CrossingError,
    time::{ClockTime, MINUTES_PER_DAY},
    CrossingWindow, TideDataset,
};
use chrono::NaiveDate;
use std::{fs, path::Path};

/// Recommended timings for one safe window.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossingPlan {
    pub start: ClockTime,
    pub end: ClockTime,
    /// Window length in minutes
    pub duration_minutes: u32,
    /// Cross before this
    pub midpoint: ClockTime,
    /// Be at the causeway by this
    pub arrive_by: ClockTime,
    /// Set off from the start point at this
    pub depart_at: ClockTime,
    /// Window length is outside the typical range; check the source times
    pub unusual_duration: bool,
}

/// Plan a crossing for a window given as clock times.
///
/// An end before the start is taken to be on the following day.
///
/// ```
/// use crossing_lib::{config::PlannerConfig, planner::plan_crossing};
///
/// let plan = plan_crossing(
///     "11:05".parse().unwrap(),
///     "19:15".parse().unwrap(),
///     &PlannerConfig::default(),
/// );
/// assert_eq!(plan.midpoint.to_string(), "15:10");
/// assert_eq!(plan.arrive_by.to_string(), "13:40");
/// assert_eq!(plan.depart_at.to_string(), "08:40");
/// ```
pub fn plan_crossing(start: ClockTime, end: ClockTime, settings: &PlannerConfig) -> CrossingPlan {
    let mut duration = end.minutes() as i64 - start.minutes() as i64;
    if duration < 0 {
        duration += MINUTES_PER_DAY as i64;
    }

    let midpoint = start.offset(duration / 2);
    let arrive_by = midpoint.offset(-settings.causeway_lead_minutes);
    let depart_at = arrive_by.offset(-settings.walk_minutes);

    let unusual_duration =
        duration < settings.typical_min_hours * 60 || duration > settings.typical_max_hours * 60;

    CrossingPlan {
        start,
        end,
        duration_minutes: duration as u32,
        midpoint,
        arrive_by,
        depart_at,
        unusual_duration,
    }
}

/// Read a dataset previously written by the aggregator.
pub fn load_dataset(path: &Path) -> Result<TideDataset, CrossingError> {
    let json = fs::read_to_string(path).map_err(|source| CrossingError::SourceRead {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(serde_json::from_str(&json)?)
}

/// First safe window stored under `date`.
pub fn first_window(dataset: &TideDataset, date: NaiveDate) -> Option<&CrossingWindow> {
    dataset.data.get(&date).and_then(|windows| windows.first())
}

/// Plan for the first safe window on `date`.
pub fn plan_for_date(
    dataset: &TideDataset,
    date: NaiveDate,
    settings: &PlannerConfig,
) -> Result<CrossingPlan, CrossingError> {
    let window = first_window(dataset, date).ok_or(CrossingError::DataUnavailable(date))?;
    Ok(plan_crossing(window.start, window.end, settings))
}
