use std::collections::HashSet;

use polars::prelude::*;
use serde::Serialize;
use urbanmart_parser::model::{CHANNEL, CUSTOMER_SEGMENT, DATE, PRODUCT_CATEGORY, STORE_LOCATION};
use urbanmart_parser::{days_to_date, TransactionTable};

use crate::filter::{DateRange, FilterCriteria, ALL_CHANNELS};
use crate::metrics::MetricsError;

/// Values a user can choose from, in the order they first appear in the data.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterOptions {
    pub date_bounds: Option<DateRange>,
    pub stores: Vec<String>,
    pub channels: Vec<String>,
    pub categories: Vec<String>,
    pub segments: Vec<String>,
}

impl FilterOptions {
    /// Single-select channel list with the `All` sentinel first.
    pub fn channel_choices(&self) -> Vec<String> {
        std::iter::once(ALL_CHANNELS.to_string())
            .chain(self.channels.iter().cloned())
            .collect()
    }

    /// Initial dashboard state: the whole date span, nothing else restricted.
    pub fn default_criteria(&self) -> FilterCriteria {
        FilterCriteria {
            date_range: self.date_bounds,
            ..FilterCriteria::default()
        }
    }
}

pub fn filter_options(table: &TransactionTable) -> Result<FilterOptions, MetricsError> {
    let df = table.df();

    Ok(FilterOptions {
        date_bounds: date_bounds(df)?,
        stores: distinct_in_order(df, STORE_LOCATION)?,
        channels: distinct_in_order(df, CHANNEL)?,
        categories: distinct_in_order(df, PRODUCT_CATEGORY)?,
        segments: distinct_in_order(df, CUSTOMER_SEGMENT)?,
    })
}

fn distinct_in_order(df: &DataFrame, column: &str) -> Result<Vec<String>, MetricsError> {
    let values = df.column(column)?.str()?;
    let mut seen: HashSet<&str> = HashSet::new();
    let mut ordered = Vec::new();
    for idx in 0..df.height() {
        if let Some(value) = values.get(idx) {
            if seen.insert(value) {
                ordered.push(value.to_string());
            }
        }
    }
    Ok(ordered)
}

fn date_bounds(df: &DataFrame) -> Result<Option<DateRange>, MetricsError> {
    let dates = df.column(DATE)?.date()?;
    let mut bounds: Option<(i32, i32)> = None;
    for idx in 0..df.height() {
        if let Some(days) = dates.get(idx) {
            bounds = Some(match bounds {
                Some((min, max)) => (min.min(days), max.max(days)),
                None => (days, days),
            });
        }
    }

    let Some((min, max)) = bounds else {
        return Ok(None);
    };
    let start = days_to_date(min).ok_or(MetricsError::DateOutOfRange { days: min })?;
    let end = days_to_date(max).ok_or(MetricsError::DateOutOfRange { days: max })?;
    Ok(Some(DateRange::new(start, end)))
}
