use chrono::{Datelike, NaiveDate, Weekday};
use polars::prelude::*;

use crate::errors::TableError;

pub const TRANSACTION_ID: &str = "transaction_id";
pub const DATE: &str = "date";
pub const STORE_LOCATION: &str = "store_location";
pub const CHANNEL: &str = "channel";
pub const PRODUCT_CATEGORY: &str = "product_category";
pub const CUSTOMER_SEGMENT: &str = "customer_segment";
pub const PRODUCT_NAME: &str = "product_name";
pub const CUSTOMER_ID: &str = "customer_id";
pub const QUANTITY: &str = "quantity";
pub const UNIT_PRICE: &str = "unit_price";
pub const DISCOUNT_APPLIED: &str = "discount_applied";
pub const LINE_REVENUE: &str = "line_revenue";
pub const DAY_OF_WEEK: &str = "day_of_week";
pub const QUARTER: &str = "quarter";

/// Columns a source file must carry.
pub const REQUIRED_COLUMNS: [&str; 11] = [
    TRANSACTION_ID,
    DATE,
    STORE_LOCATION,
    CHANNEL,
    PRODUCT_CATEGORY,
    CUSTOMER_SEGMENT,
    PRODUCT_NAME,
    CUSTOMER_ID,
    QUANTITY,
    UNIT_PRICE,
    DISCOUNT_APPLIED,
];

/// Column layout of every [`TransactionTable`], source columns first then derived ones.
pub const TABLE_COLUMNS: [&str; 14] = [
    TRANSACTION_ID,
    DATE,
    STORE_LOCATION,
    CHANNEL,
    PRODUCT_CATEGORY,
    CUSTOMER_SEGMENT,
    PRODUCT_NAME,
    CUSTOMER_ID,
    QUANTITY,
    UNIT_PRICE,
    DISCOUNT_APPLIED,
    LINE_REVENUE,
    DAY_OF_WEEK,
    QUARTER,
];

const DAYS_FROM_CE_TO_UNIX_EPOCH: i32 = 719_163;

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - DAYS_FROM_CE_TO_UNIX_EPOCH
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days + DAYS_FROM_CE_TO_UNIX_EPOCH)
}

pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Calendar quarter label such as `2024Q3`.
pub fn quarter_label(date: NaiveDate) -> String {
    format!("{}Q{}", date.year(), date.month0() / 3 + 1)
}

/// One parsed line item before it is columnised.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    pub transaction_id: String,
    pub date: NaiveDate,
    pub store_location: String,
    pub channel: String,
    pub product_category: String,
    pub customer_segment: String,
    pub product_name: String,
    pub customer_id: String,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub discount_applied: Option<f64>,
}

impl TransactionRecord {
    /// `quantity * unit_price - discount_applied`; null when any operand is blank.
    pub fn line_revenue(&self) -> Option<f64> {
        Some(self.quantity? * self.unit_price? - self.discount_applied?)
    }
}

/// The loaded transaction table with its derived columns.
///
/// Never mutated after construction. Filtering produces a new table; clones share
/// the underlying column buffers.
#[derive(Debug, Clone)]
pub struct TransactionTable {
    df: DataFrame,
}

impl TransactionTable {
    /// Wraps a frame that already has the [`TABLE_COLUMNS`] layout, e.g. a filtered view.
    pub fn from_df(df: DataFrame) -> Result<Self, TableError> {
        let found: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        if found.len() != TABLE_COLUMNS.len()
            || found.iter().zip(TABLE_COLUMNS.iter()).any(|(a, b)| a != b)
        {
            return Err(TableError::Schema {
                expected: TABLE_COLUMNS.to_vec(),
                found,
            });
        }
        Ok(Self { df })
    }

    pub fn from_records(records: &[TransactionRecord]) -> PolarsResult<Self> {
        build_table(records).map(|df| Self { df })
    }

    pub fn df(&self) -> &DataFrame {
        &self.df
    }

    pub fn height(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }
}

/// Columnises parsed records and appends `line_revenue`, `day_of_week` and `quarter`.
pub(crate) fn build_table(records: &[TransactionRecord]) -> PolarsResult<DataFrame> {
    let len = records.len();

    let mut dates = Vec::with_capacity(len);
    let mut quantities = Vec::with_capacity(len);
    let mut prices = Vec::with_capacity(len);
    let mut discounts = Vec::with_capacity(len);
    let mut revenue = Vec::with_capacity(len);
    let mut weekdays: Vec<&str> = Vec::with_capacity(len);
    let mut quarters: Vec<String> = Vec::with_capacity(len);

    for record in records {
        dates.push(date_to_days(record.date));
        quantities.push(record.quantity);
        prices.push(record.unit_price);
        discounts.push(record.discount_applied);
        revenue.push(record.line_revenue());
        weekdays.push(weekday_name(record.date));
        quarters.push(quarter_label(record.date));
    }

    let date_series = Series::new(DATE.into(), dates).cast(&DataType::Date)?;

    DataFrame::new(vec![
        text_column(records, TRANSACTION_ID, |r| r.transaction_id.as_str()),
        date_series.into(),
        text_column(records, STORE_LOCATION, |r| r.store_location.as_str()),
        text_column(records, CHANNEL, |r| r.channel.as_str()),
        text_column(records, PRODUCT_CATEGORY, |r| r.product_category.as_str()),
        text_column(records, CUSTOMER_SEGMENT, |r| r.customer_segment.as_str()),
        text_column(records, PRODUCT_NAME, |r| r.product_name.as_str()),
        text_column(records, CUSTOMER_ID, |r| r.customer_id.as_str()),
        Series::new(QUANTITY.into(), quantities).into(),
        Series::new(UNIT_PRICE.into(), prices).into(),
        Series::new(DISCOUNT_APPLIED.into(), discounts).into(),
        Series::new(LINE_REVENUE.into(), revenue).into(),
        Series::new(DAY_OF_WEEK.into(), weekdays).into(),
        Series::new(QUARTER.into(), quarters).into(),
    ])
}

fn text_column(
    records: &[TransactionRecord],
    name: &str,
    pick: fn(&TransactionRecord) -> &str,
) -> Column {
    Series::new(
        name.into(),
        records.iter().map(pick).collect::<Vec<&str>>(),
    )
    .into()
}
