//! # Error Taxonomy
//!
//! Every failure in the extraction pipeline is a [`CrossingError`]. How far a
//! failure travels depends on the unit of work it belongs to:
//!
//! - **Cell**: a label that doesn't match the interval grammar is not an error
//!   at all, the cell simply yields no period.
//! - **Row**: [`CrossingError::InvalidDate`] and ordinal decode failures skip
//!   the row; sibling rows continue.
//! - **Date**: [`CrossingError::Lookup`] leaves that date without solar data.
//! - **File**: [`CrossingError::Format`] and [`CrossingError::SourceRead`] skip
//!   the file in directory mode and end the run in single-file mode.

use chrono::NaiveDate;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CrossingError {
    /// Input text didn't match an expected shape (identifier, clock time, ordinal)
    #[error("format error: {0}")]
    Format(String),

    /// Day number doesn't exist in the month being processed
    #[error("invalid calendar date {year}-{month:02}-{day:02}")]
    InvalidDate { year: i32, month: u32, day: u32 },

    /// Solar data lookup failed for one date
    #[error("solar lookup for {date} failed: {reason}")]
    Lookup { date: NaiveDate, reason: String },

    /// Source document could not be read
    #[error("could not read {}: {source}", .path.display())]
    SourceRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Directory held no candidate documents
    #[error("no HTML documents found in {}", .0.display())]
    NoInputs(PathBuf),

    /// Requested date has no stored crossing window
    #[error("no crossing data for {0}")]
    DataUnavailable(NaiveDate),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}
