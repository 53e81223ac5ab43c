//! # Crossing Table Extraction
//!
//! The council publishes one HTML calendar table per month. Each data row
//! looks like:
//!
//! ```html
//! <tr class="row1">
//!   <td>Fri</td><td>5th</td>
//!   <td class="safe">11:05 until 19:15</td>
//!   <td class="unsafe">19:15 until 23:00</td>
//!   <td class="safe">23:00 until 07:45 (Sat)</td>
//!   <td>...</td>
//! </tr>
//! ```
//!
//! Rows alternate between the `row1` and `row2` classes. The first two cells
//! are the weekday and the ordinal day; cells classed `safe`/`unsafe` whose
//! text contains "until" are time ranges.
//!
//! ## Midnight Crossings
//! A range crosses midnight when it carries a trailing day hint such as
//! `(Sat)` or when its end is earlier than its start. A leading hint,
//! `(Fri) 23:00 until 07:45`, marks a range that began the previous day.
//!
//! ## Deduplication
//! A window that crosses midnight is listed on both days it touches. Only the
//! copy whose start date equals the row's own date is kept, so every window
//! lands under exactly one date key.

use crate::{
    period::{decode_ordinal_day, MonthContext},
    time::ClockTime,
    Classification, DayPeriods, SourcePeriod,
};
use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Rows with fewer cells are headers or malformed
const MIN_ROW_CELLS: usize = 6;

/// Separator that marks a cell as a time range
const INTERVAL_MARKER: &str = "until";

static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\((\w+)\)\s*)?(\d{1,2}:\d{2})\s+until\s+(\d{1,2}:\d{2})(?:\s*\((\w+)\))?")
        .unwrap()
});

/// All periods found in one table row, before any filtering.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractedRow {
    pub weekday: String,
    pub date: NaiveDate,
    pub periods: Vec<SourcePeriod>,
}

impl ExtractedRow {
    /// SAFE periods that start on this row's date.
    pub fn safe_windows(&self) -> Vec<SourcePeriod> {
        self.periods
            .iter()
            .filter(|p| p.is_safe() && p.start_date == self.date)
            .cloned()
            .collect()
    }
}

/// Parse `"HH:MM until HH:MM [(Day)]"` against the row's date.
///
/// Returns `None` if the text doesn't follow the grammar; a cell that isn't a
/// time range is not an error.
///
/// ```
/// use chrono::NaiveDate;
/// use crossing_lib::{extract::parse_time_range, Classification};
///
/// let base = NaiveDate::from_ymd_opt(2025, 9, 5).unwrap();
/// let p = parse_time_range("23:00 until 07:45 (Sat)", Classification::Safe, base).unwrap();
/// assert_eq!(p.start_date.to_string(), "2025-09-05");
/// assert_eq!(p.end_date.to_string(), "2025-09-06");
/// ```
pub fn parse_time_range(
    text: &str,
    classification: Classification,
    base_date: NaiveDate,
) -> Option<SourcePeriod> {
    let caps = RANGE_RE.captures(text)?;

    let start: ClockTime = caps[2].parse().ok()?;
    let end: ClockTime = caps[3].parse().ok()?;
    let started_previous_day = caps.get(1).is_some();
    let ends_next_day = caps.get(4).is_some() || end < start;

    let (start_date, end_date) = if started_previous_day {
        (base_date.pred_opt()?, base_date)
    } else if ends_next_day {
        (base_date, base_date.succ_opt()?)
    } else {
        (base_date, base_date)
    };

    Some(SourcePeriod {
        classification,
        start,
        end,
        start_date,
        end_date,
    })
}

/// Scan a document for calendar rows and the periods in each.
///
/// Rows that are too short or whose day doesn't exist in the month are
/// skipped; the rest of the document is still processed. Bare row fragments
/// with no enclosing `<table>` are accepted too.
pub fn extract_rows(html: &str, month: &MonthContext) -> Vec<ExtractedRow> {
    let doc = parse_table_document(html);

    let row_sel = Selector::parse("tr.row1, tr.row2").expect("CSS selector should be valid");
    let cell_sel = Selector::parse("td").expect("CSS selector should be valid");

    let mut rows = Vec::new();
    for row in doc.select(&row_sel) {
        let cells: Vec<ElementRef> = row.select(&cell_sel).collect();
        if cells.len() < MIN_ROW_CELLS {
            debug!(cells = cells.len(), "skipping short row");
            continue;
        }

        let weekday = cell_text(cells[0]);
        let ordinal = cell_text(cells[1]);

        let date = match decode_ordinal_day(&ordinal).and_then(|day| month.date(day)) {
            Ok(date) => date,
            Err(err) => {
                warn!(%err, %weekday, %ordinal, "skipping row");
                continue;
            }
        };

        let periods: Vec<SourcePeriod> = cells
            .iter()
            .filter_map(|&cell| {
                let classification = classification_of(cell)?;
                let text = cell_text(cell);
                if !text.contains(INTERVAL_MARKER) {
                    return None;
                }
                let parsed = parse_time_range(&text, classification, date);
                if parsed.is_none() {
                    debug!(%date, %text, "cell has interval marker but no parseable range");
                }
                parsed
            })
            .collect();

        rows.push(ExtractedRow {
            weekday,
            date,
            periods,
        });
    }

    if rows.is_empty() && !html.trim().is_empty() {
        warn!(month = %month.label(), "no calendar rows found in document");
    }

    rows
}

/// The HTML parser drops `<tr>`/`<td>` outside a table, so row fragments are
/// wrapped in one first.
fn parse_table_document(html: &str) -> Html {
    if html.to_ascii_lowercase().contains("<table") {
        Html::parse_document(html)
    } else {
        Html::parse_document(&format!("<table>{html}</table>"))
    }
}

/// Extract one document into its day records.
///
/// Each date with at least one surviving SAFE window gets an entry. Rows map
/// to distinct dates, so if a document repeats a date the later row wins.
pub fn extract_document(html: &str, month: &MonthContext) -> DayPeriods {
    let mut days = DayPeriods::new();
    for row in extract_rows(html, month) {
        let windows = row.safe_windows();
        if windows.is_empty() {
            debug!(date = %row.date, "no safe windows start on this day");
            continue;
        }
        days.insert(row.date, windows);
    }
    days
}

fn classification_of(cell: ElementRef) -> Option<Classification> {
    cell.value().classes().find_map(|class| match class {
        "safe" => Some(Classification::Safe),
        "unsafe" => Some(Classification::Unsafe),
        _ => None,
    })
}

/// Cell text with internal whitespace collapsed.
fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}
