use std::path::PathBuf;

use polars::prelude::PolarsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {source}")]
    Csv {
        #[source]
        source: csv::Error,
    },

    #[error("required column '{column}' is missing from the header")]
    MissingColumn { column: &'static str },

    #[error("data row {line_index} has invalid date '{value}' (expected DD-MM-YYYY)")]
    InvalidDate { line_index: usize, value: String },

    #[error("data row {line_index} column '{column}' is not a number: '{value}'")]
    InvalidNumber {
        line_index: usize,
        column: &'static str,
        value: String,
    },

    #[error("failed to build transaction table: {0}")]
    Polars(#[from] PolarsError),
}

impl LoadError {
    /// A required column is absent; the table cannot be built at all.
    pub fn is_schema_error(&self) -> bool {
        matches!(self, LoadError::MissingColumn { .. })
    }

    /// A cell could not be read under the expected format.
    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            LoadError::InvalidDate { .. } | LoadError::InvalidNumber { .. }
        )
    }
}

impl From<csv::Error> for LoadError {
    fn from(source: csv::Error) -> Self {
        LoadError::Csv { source }
    }
}

#[derive(Debug, Error)]
pub enum TableError {
    #[error("expected columns {expected:?}, found {found:?}")]
    Schema {
        expected: Vec<&'static str>,
        found: Vec<String>,
    },
}
