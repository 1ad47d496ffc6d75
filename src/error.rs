//! Error types surfaced by the library.
//!
//! Command handlers wrap these with `anyhow::Context`; only
//! [`AnalysisError::MissingCoreFields`] aborts an analysis run; every other
//! gap in the data degrades the output instead.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Missing core survey column(s): {}", fields.join(", "))]
    MissingCoreFields { fields: Vec<String> },
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Opening dataset {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Reading row {row} of {path:?}")]
    Read {
        path: PathBuf,
        row: usize,
        #[source]
        source: csv::Error,
    },
    #[error("Failed to decode text with encoding {encoding}")]
    Decode { encoding: &'static str },
    #[error("Row {row} has {found} field(s) but the header declares {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("Column '{name}' has {found} value(s) but the dataset has {expected} row(s)")]
    ColumnLength {
        name: String,
        expected: usize,
        found: usize,
    },
    #[error("Column '{0}' already exists")]
    DuplicateColumn(String),
    #[error("No common join keys found (expected any of: {})", expected.join(", "))]
    NoJoinKeys { expected: Vec<String> },
    #[error("Household key '{key}' appears more than once")]
    DuplicateJoinKey { key: String },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Opening configuration file {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Parsing configuration YAML")]
    Parse(#[from] serde_yaml::Error),
    #[error("Alias list for '{field}' is empty")]
    EmptyAliases { field: String },
    #[error("Code table '{table}' has no label for code {code}")]
    MissingLabel { table: String, code: i64 },
}
