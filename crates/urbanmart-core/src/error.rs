// crates/urbanmart-core/src/error.rs

use thiserror::Error;
use urbanmart_parser::{LoadError, TableError};

use crate::filter::FilterError;
use crate::metrics::MetricsError;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("failed to load transactions: {0}")]
    Load(#[from] LoadError),

    #[error("filtering failed: {0}")]
    Filter(#[from] FilterError),

    #[error("aggregation failed: {0}")]
    Metrics(#[from] MetricsError),

    #[error("table layout error: {0}")]
    Table(#[from] TableError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
