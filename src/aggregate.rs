//! # Dataset Aggregation
//!
//! Drives the pipeline over one document or a directory of documents and
//! builds the persisted [`TideDataset`].
//!
//! ## Modes
//! - **Single file**: any failure (bad name, unreadable file) ends the run.
//! - **Directory**: every `.html` file is processed in name order; a file
//!   that fails is logged and skipped, the rest still go into the dataset.
//!
//! ## Merging
//! Each file normally owns one month, so date keys shouldn't collide. If they
//! do, the later file wins and a warning names the date and both files.
//!
//! Everything runs sequentially on one task: the solar cache and courtesy
//! delay assume lookups are never in flight concurrently.

use crate::{
    error::CrossingError,
    extract::extract_document,
    period::{decode_month_context, MonthContext},
    solar::{SolarEnricher, SolarLookup},
    CrossingWindow, DayPeriods, DayWindows, TideDataset,
};
use chrono::{NaiveDate, SecondsFormat, Utc};
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

/// File name for the combined directory-mode dataset
pub const COMBINED_OUTPUT: &str = "tides.json";

/// Outcome of a directory run.
#[derive(Debug)]
pub struct DirectoryReport {
    pub dataset: TideDataset,
    /// Files that failed and were left out
    pub skipped: Vec<PathBuf>,
    /// Dates supplied by more than one file
    pub conflicts: Vec<DateConflict>,
}

/// A date whose windows from `earlier` were replaced by those from `later`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DateConflict {
    pub date: NaiveDate,
    pub earlier: PathBuf,
    pub later: PathBuf,
}

pub struct Aggregator<L> {
    enricher: SolarEnricher<L>,
    source_label: String,
}

impl<L: SolarLookup> Aggregator<L> {
    pub fn new(enricher: SolarEnricher<L>, source_label: impl Into<String>) -> Self {
        Self {
            enricher,
            source_label: source_label.into(),
        }
    }

    pub fn enricher(&self) -> &SolarEnricher<L> {
        &self.enricher
    }

    /// Attach solar data to every window, one lookup per distinct date.
    pub async fn enrich(&mut self, days: DayPeriods) -> DayWindows {
        let mut windows = DayWindows::new();
        for (date, periods) in days {
            let solar = self.enricher.solar_for(date).await;
            let enriched = periods
                .into_iter()
                .map(|period| CrossingWindow::new(period, solar.clone()))
                .collect();
            windows.insert(date, enriched);
        }
        windows
    }

    /// Extract and enrich one document's text.
    pub async fn process_document(&mut self, html: &str, month: &MonthContext) -> DayWindows {
        let days = extract_document(html, month);
        self.enrich(days).await
    }

    /// Decode the month from the file name, then read and process the file.
    pub async fn process_file(
        &mut self,
        path: &Path,
    ) -> Result<(MonthContext, DayWindows), CrossingError> {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| CrossingError::Format(format!("unusable file name {}", path.display())))?;
        let month = decode_month_context(name)?;

        let html = fs::read_to_string(path).map_err(|source| CrossingError::SourceRead {
            path: path.to_path_buf(),
            source,
        })?;

        let days = self.process_document(&html, &month).await;
        info!(file = %path.display(), month = %month.label(), days = days.len(), "processed");
        Ok((month, days))
    }

    /// Process a single month's document. Any failure is returned.
    pub async fn single_file(
        &mut self,
        path: &Path,
    ) -> Result<(MonthContext, TideDataset), CrossingError> {
        let (month, data) = self.process_file(path).await?;

        let dataset = TideDataset {
            last_updated: timestamp(),
            source: self.source_label.clone(),
            month: Some(month.label()),
            months: None,
            total_days: None,
            data,
        };
        Ok((month, dataset))
    }

    /// Process every HTML document in `dir` into one combined dataset.
    ///
    /// Only failing to list the directory, or finding nothing to process, is
    /// an error; per-file failures are skipped.
    pub async fn directory(&mut self, dir: &Path) -> Result<DirectoryReport, CrossingError> {
        let files = html_files(dir)?;
        if files.is_empty() {
            return Err(CrossingError::NoInputs(dir.to_path_buf()));
        }
        info!(dir = %dir.display(), files = files.len(), "processing directory");

        let mut data = DayWindows::new();
        let mut months = Vec::new();
        let mut total_days = 0;
        let mut skipped = Vec::new();
        let mut origins: HashMap<NaiveDate, PathBuf> = HashMap::new();
        let mut conflicts = Vec::new();

        for path in files {
            match self.process_file(&path).await {
                Ok((month, days)) => {
                    total_days += days.len();
                    months.push(month.label());
                    for (date, windows) in days {
                        data.insert(date, windows);
                        if let Some(earlier) = origins.insert(date, path.clone()) {
                            warn!(
                                %date,
                                earlier = %earlier.display(),
                                later = %path.display(),
                                "date supplied by two files, keeping the later"
                            );
                            conflicts.push(DateConflict {
                                date,
                                earlier,
                                later: path.clone(),
                            });
                        }
                    }
                }
                Err(err) => {
                    warn!(file = %path.display(), %err, "skipping file");
                    skipped.push(path);
                }
            }
        }

        Ok(DirectoryReport {
            dataset: TideDataset {
                last_updated: timestamp(),
                source: self.source_label.clone(),
                month: None,
                months: Some(months),
                total_days: Some(total_days),
                data,
            },
            skipped,
            conflicts,
        })
    }
}

/// `tides-YYYY-MM.json` for a single month's dataset.
pub fn month_output_name(month: &MonthContext) -> String {
    format!("tides-{}-{}.json", month.year_key, month.month_key)
}

/// Write the dataset as pretty JSON, creating the directory if needed.
pub fn write_dataset(
    dataset: &TideDataset,
    dir: &Path,
    file_name: &str,
) -> Result<PathBuf, CrossingError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(file_name);
    let json = serde_json::to_string_pretty(dataset)?;
    fs::write(&path, json)?;
    Ok(path)
}

/// `.html`/`.htm` files in `dir`, sorted by name.
fn html_files(dir: &Path) -> Result<Vec<PathBuf>, CrossingError> {
    let entries = fs::read_dir(dir).map_err(|source| CrossingError::SourceRead {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let is_html = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html") || e.eq_ignore_ascii_case("htm"));
        if path.is_file() && is_html {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}
