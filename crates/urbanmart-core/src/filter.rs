use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use urbanmart_parser::model::{CHANNEL, CUSTOMER_SEGMENT, DATE, PRODUCT_CATEGORY, STORE_LOCATION};
use urbanmart_parser::{days_to_date, TableError, TransactionTable};

pub const ALL_CHANNELS: &str = "All";

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("filtered frame lost the transaction layout: {0}")]
    Table(#[from] TableError),
}

/// Inclusive on both ends. A range with `start > end` matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    fn contains_days(&self, days: i32) -> bool {
        days_to_date(days).is_some_and(|date| self.contains(date))
    }
}

/// Single-select channel dimension; `All` disables it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ChannelSelection {
    #[default]
    All,
    Only(String),
}

impl From<String> for ChannelSelection {
    fn from(value: String) -> Self {
        if value.trim().eq_ignore_ascii_case(ALL_CHANNELS) {
            ChannelSelection::All
        } else {
            ChannelSelection::Only(value)
        }
    }
}

impl From<&str> for ChannelSelection {
    fn from(value: &str) -> Self {
        ChannelSelection::from(value.to_string())
    }
}

impl From<ChannelSelection> for String {
    fn from(value: ChannelSelection) -> Self {
        match value {
            ChannelSelection::All => ALL_CHANNELS.to_string(),
            ChannelSelection::Only(channel) => channel,
        }
    }
}

impl fmt::Display for ChannelSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelSelection::All => f.write_str(ALL_CHANNELS),
            ChannelSelection::Only(channel) => f.write_str(channel),
        }
    }
}

/// User-selected restrictions. An empty set means the dimension is not filtered.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    pub date_range: Option<DateRange>,
    pub stores: BTreeSet<String>,
    pub channel: ChannelSelection,
    pub categories: BTreeSet<String>,
    pub segments: BTreeSet<String>,
}

impl FilterCriteria {
    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_stores<I, S>(mut self, stores: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stores = stores.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_channel(mut self, channel: impl Into<ChannelSelection>) -> Self {
        self.channel = channel.into();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.segments = segments.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_unrestricted(&self) -> bool {
        self.date_range.is_none()
            && self.stores.is_empty()
            && self.channel == ChannelSelection::All
            && self.categories.is_empty()
            && self.segments.is_empty()
    }
}

fn allows(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    selected.is_empty() || value.is_some_and(|v| selected.contains(v))
}

/// Result of filtering, with "no rows" as its own state rather than an error.
#[derive(Debug, Clone)]
pub enum FilterOutcome {
    Rows(TransactionTable),
    Empty,
}

impl FilterOutcome {
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterOutcome::Empty)
    }

    pub fn rows(&self) -> Option<&TransactionTable> {
        match self {
            FilterOutcome::Rows(table) => Some(table),
            FilterOutcome::Empty => None,
        }
    }
}

/// Keeps the rows that satisfy every active dimension. The input table is untouched.
pub fn apply_filters(
    table: &TransactionTable,
    criteria: &FilterCriteria,
) -> Result<TransactionTable, FilterError> {
    if criteria.is_unrestricted() {
        return Ok(table.clone());
    }

    let df = table.df();
    let len = df.height();

    let dates = df.column(DATE)?.date()?;
    let stores = df.column(STORE_LOCATION)?.str()?;
    let channels = df.column(CHANNEL)?.str()?;
    let categories = df.column(PRODUCT_CATEGORY)?.str()?;
    let segments = df.column(CUSTOMER_SEGMENT)?.str()?;

    let mut mask = Vec::with_capacity(len);
    for idx in 0..len {
        let in_range = match (&criteria.date_range, dates.get(idx)) {
            (None, _) => true,
            (Some(range), Some(days)) => range.contains_days(days),
            (Some(_), None) => false,
        };
        let channel_ok = match &criteria.channel {
            ChannelSelection::All => true,
            ChannelSelection::Only(wanted) => channels.get(idx) == Some(wanted.as_str()),
        };

        mask.push(
            in_range
                && allows(&criteria.stores, stores.get(idx))
                && channel_ok
                && allows(&criteria.categories, categories.get(idx))
                && allows(&criteria.segments, segments.get(idx)),
        );
    }

    let filtered = df.filter(&BooleanChunked::from_slice("mask".into(), &mask))?;
    debug!(input_rows = len, output_rows = filtered.height(), "applied filters");

    Ok(TransactionTable::from_df(filtered)?)
}

pub fn filter_table(
    table: &TransactionTable,
    criteria: &FilterCriteria,
) -> Result<FilterOutcome, FilterError> {
    let filtered = apply_filters(table, criteria)?;
    if filtered.is_empty() {
        Ok(FilterOutcome::Empty)
    } else {
        Ok(FilterOutcome::Rows(filtered))
    }
}
