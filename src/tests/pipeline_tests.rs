//! # End-to-End Pipeline Tests
//!
//! Run a realistic month of council tables through extraction, enrichment,
//! aggregation and output, with the solar service replaced by fixed data so
//! the tests never touch the network.

use std::fs;
use std::time::Duration;

use chrono::NaiveDate;
use clap::Parser;
use crossing_lib::{
    aggregate::{month_output_name, write_dataset, Aggregator, COMBINED_OUTPUT},
    config::PlannerConfig,
    extract::{extract_document, extract_rows},
    period::decode_month_context,
    planner,
    solar::{SolarEnricher, SolarTimes, StaticSolarLookup},
    CrossingError, TideDataset,
};
use tempfile::tempdir;

use crate::{Cli, Command};

const SEPTEMBER: &str = include_str!("fixtures/09-25.html");

fn september(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
}

fn solar_times() -> SolarTimes {
    SolarTimes {
        sunrise: "6:33:12 AM".into(),
        sunset: "7:38:40 PM".into(),
        dawn: "5:59:42 AM".into(),
        dusk: "8:12:10 PM".into(),
        solar_noon: "1:05:56 PM".into(),
        golden_hour: "6:59:40 PM".into(),
        day_length: "13:05:28".into(),
    }
}

fn aggregator() -> Aggregator<StaticSolarLookup> {
    let lookup = StaticSolarLookup::new().with_default(solar_times());
    Aggregator::new(SolarEnricher::new(lookup, Duration::ZERO), "Test Council")
}

/// Every data row of the fixture yields a dated row, except the note row
/// (too few cells) and the 31st (not a September date).
#[test]
fn fixture_rows_are_extracted() {
    let month = decode_month_context("sourcedata/09-25.html").unwrap();
    let rows = extract_rows(SEPTEMBER, &month);

    let dates: Vec<NaiveDate> = rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, (1..=6).map(september).collect::<Vec<_>>());
    assert_eq!(rows[4].weekday, "Fri");
    // The 6th has one unsafe range and an informational "safe" cell
    assert_eq!(rows[5].periods.len(), 1);
}

/// Windows spilling in from the previous day are listed only under the day
/// they start on.
#[test]
fn fixture_windows_are_deduplicated_by_start_date() {
    let month = decode_month_context("09-25.html").unwrap();
    let days = extract_document(SEPTEMBER, &month);

    assert_eq!(days.keys().copied().collect::<Vec<_>>(), (1..=5).map(september).collect::<Vec<_>>());

    let counts: Vec<usize> = days.values().map(Vec::len).collect();
    assert_eq!(counts, vec![1, 2, 1, 2, 2]);

    for (date, periods) in &days {
        for period in periods {
            assert!(period.is_safe());
            assert_eq!(period.start_date, *date);
        }
    }

    // 1st: the Sunday-evening window is not repeated under Monday
    assert_eq!(days[&september(1)][0].start.to_string(), "09:15");
    // 4th: end before start crosses midnight without a hint
    assert_eq!(days[&september(4)][0].end_date, september(5));
}

/// Row fragments saved without their surrounding table give the same days.
#[test]
fn fixture_rows_without_table_markup() {
    let month = decode_month_context("09-25.html").unwrap();
    let rows_only: String = SEPTEMBER
        .lines()
        .filter(|line| line.starts_with("<tr class=\"row"))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(!rows_only.contains("<table"));

    assert_eq!(
        extract_document(&rows_only, &month),
        extract_document(SEPTEMBER, &month)
    );
    assert_eq!(extract_rows(&rows_only, &month).len(), 6);
}

#[tokio::test]
async fn fixture_month_is_enriched() {
    let month = decode_month_context("09-25.html").unwrap();
    let mut agg = aggregator();
    let data = agg.process_document(SEPTEMBER, &month).await;

    let fifth = &data[&september(5)];
    assert_eq!(fifth[0].midpoint.to_string(), "15:10");
    assert!(fifth[0].daylight);
    assert_eq!(fifth[1].midpoint.to_string(), "03:22");
    assert!(!fifth[1].daylight);

    let second = &data[&september(2)];
    assert_eq!(second[0].midpoint.to_string(), "01:50");
    assert_eq!(
        second[0].photography.as_ref().unwrap().golden_hour_evening,
        "18:59-19:38"
    );

    // One lookup per date with windows
    assert_eq!(agg.enricher().lookups_made(), 5);
}

#[tokio::test]
async fn directory_run_writes_combined_dataset() {
    let input = tempdir().unwrap();
    let output = tempdir().unwrap();

    fs::write(input.path().join("09-25.html"), SEPTEMBER).unwrap();
    fs::write(
        input.path().join("10-25.html"),
        r#"<table><tr class="row1"><td>Wed</td><td>1st</td><td class="safe">11:00 until 19:05</td>
           <td class="unsafe">19:05 until 23:10</td><td></td><td></td></tr></table>"#,
    )
    .unwrap();
    fs::write(input.path().join("2025-11.html"), SEPTEMBER).unwrap();

    let report = aggregator().directory(input.path()).await.unwrap();
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.dataset.total_days, Some(6));
    assert_eq!(report.dataset.data.len(), 6);

    let path = write_dataset(&report.dataset, &output.path().join("data"), COMBINED_OUTPUT).unwrap();
    let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();

    assert_eq!(json["source"], "Test Council");
    assert_eq!(json["months"][0], "September 2025");
    assert_eq!(json["months"][1], "October 2025");
    assert_eq!(json["totalDays"], 6);
    let window = &json["data"]["2025-09-05"][1];
    assert_eq!(window["type"], "safe");
    assert_eq!(window["startDate"], "2025-09-05");
    assert_eq!(window["endDate"], "2025-09-06");
    assert_eq!(window["photography"]["sunrise"], "06:33");

    // The planner reads back what the aggregator wrote
    let dataset: TideDataset = planner::load_dataset(&path).unwrap();
    let plan = planner::plan_for_date(&dataset, september(5), &PlannerConfig::default()).unwrap();
    assert_eq!(plan.depart_at.to_string(), "08:40");
}

#[tokio::test]
async fn single_file_run_is_named_by_month() {
    let input = tempdir().unwrap();
    let path = input.path().join("09-25.html");
    fs::write(&path, SEPTEMBER).unwrap();

    let (month, dataset) = aggregator().single_file(&path).await.unwrap();
    let written = write_dataset(&dataset, input.path(), &month_output_name(&month)).unwrap();

    assert!(written.ends_with("tides-2025-09.json"));
    assert_eq!(dataset.month.as_deref(), Some("September 2025"));
    assert_eq!(dataset.data.len(), 5);
}

#[tokio::test]
async fn unreadable_single_file_is_fatal() {
    let dir = tempdir().unwrap();
    let result = aggregator().single_file(&dir.path().join("08-25.html")).await;
    assert!(matches!(result, Err(CrossingError::SourceRead { .. })));
}

#[test]
fn cli_accepts_path_or_plan() {
    let cli = Cli::try_parse_from(["parse-tides", "sourcedata/", "--output-dir", "out"]).unwrap();
    assert!(cli.command.is_none());
    assert_eq!(cli.input.unwrap().to_str(), Some("sourcedata/"));
    assert_eq!(cli.output_dir.unwrap().to_str(), Some("out"));

    let cli = Cli::parse_from(["parse-tides"]);
    assert!(cli.input.is_none());

    let cli = Cli::try_parse_from(["parse-tides", "plan", "--date", "2025-09-05"]).unwrap();
    match cli.command {
        Some(Command::Plan { date, data }) => {
            assert_eq!(date, september(5));
            assert!(data.is_none());
        }
        None => panic!("expected plan subcommand"),
    }

    assert!(Cli::try_parse_from(["parse-tides", "plan", "--date", "05/09/2025"]).is_err());
}
