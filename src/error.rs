//! Compilation error taxonomy.
//!
//! Every variant is fatal: a run that fails leaves no trustworthy artifact.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Debug, Error)]
pub enum CompileError {
    /// Wells of the selected field without a match between the perforation
    /// data and the cross-reference table.
    #[error(
        "{} well(s) have no perforation records (at most {limit} tolerated): {}",
        .wells.len(),
        .wells.join(", ")
    )]
    Reference { wells: Vec<String>, limit: usize },

    /// A trajectory with fewer than two stations.
    #[error("Welltrack for well {well} is missing: {points} trajectory point(s), at least 2 required")]
    Integrity { well: String, points: usize },

    /// A date or number cell that does not parse.
    #[error("{file}:{line}: column '{column}': cannot parse '{value}': {reason}")]
    Format {
        file: String,
        line: u64,
        column: String,
        value: String,
        reason: String,
    },

    #[error("{file}: missing column '{column}'")]
    MissingColumn { file: String, column: String },

    #[error("Unknown text encoding '{label}' for {file}")]
    UnknownEncoding { file: String, label: String },

    #[error("Invalid date range: end {end} is before start {start}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("I/O error ({}): {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl CompileError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, CompileError>;
