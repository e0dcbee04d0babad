use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use tracing::{debug, info};

use crate::errors::LoadError;
use crate::model::{
    TransactionRecord, TransactionTable, CHANNEL, CUSTOMER_ID, CUSTOMER_SEGMENT, DATE,
    DISCOUNT_APPLIED, PRODUCT_CATEGORY, PRODUCT_NAME, QUANTITY, STORE_LOCATION,
    TRANSACTION_ID, UNIT_PRICE,
};

pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Position of every required column within the file header.
#[derive(Debug, Clone, Copy)]
struct ColumnIndex {
    transaction_id: usize,
    date: usize,
    store_location: usize,
    channel: usize,
    product_category: usize,
    customer_segment: usize,
    product_name: usize,
    customer_id: usize,
    quantity: usize,
    unit_price: usize,
    discount_applied: usize,
}

impl ColumnIndex {
    fn from_header(header: &StringRecord) -> Result<Self, LoadError> {
        let find = |column: &'static str| -> Result<usize, LoadError> {
            header
                .iter()
                .position(|name| name.trim() == column)
                .ok_or(LoadError::MissingColumn { column })
        };

        Ok(Self {
            transaction_id: find(TRANSACTION_ID)?,
            date: find(DATE)?,
            store_location: find(STORE_LOCATION)?,
            channel: find(CHANNEL)?,
            product_category: find(PRODUCT_CATEGORY)?,
            customer_segment: find(CUSTOMER_SEGMENT)?,
            product_name: find(PRODUCT_NAME)?,
            customer_id: find(CUSTOMER_ID)?,
            quantity: find(QUANTITY)?,
            unit_price: find(UNIT_PRICE)?,
            discount_applied: find(DISCOUNT_APPLIED)?,
        })
    }
}

/// Loads a transactions CSV from disk and derives the revenue/calendar columns.
pub fn load_transactions(path: impl AsRef<Path>) -> Result<TransactionTable, LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let table = parse_transactions(file)?;
    info!(path = %path.display(), rows = table.height(), "loaded transactions");
    Ok(table)
}

/// Same as [`load_transactions`] for content that is already open or in memory.
pub fn parse_transactions<R: Read>(reader: R) -> Result<TransactionTable, LoadError> {
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(true)
        .from_reader(reader);

    let header = csv_reader.headers()?.clone();
    let index = ColumnIndex::from_header(&header)?;
    debug!(?index, "resolved column positions");

    let mut records = Vec::new();
    for (offset, row) in csv_reader.records().enumerate() {
        let row = row?;
        records.push(parse_record(&row, &index, offset + 1)?);
    }

    Ok(TransactionTable::from_records(&records)?)
}

fn parse_record(
    row: &StringRecord,
    index: &ColumnIndex,
    line_index: usize,
) -> Result<TransactionRecord, LoadError> {
    let text = |position: usize| row.get(position).unwrap_or_default().trim().to_string();

    Ok(TransactionRecord {
        transaction_id: text(index.transaction_id),
        date: parse_date(row.get(index.date).unwrap_or_default(), line_index)?,
        store_location: text(index.store_location),
        channel: text(index.channel),
        product_category: text(index.product_category),
        customer_segment: text(index.customer_segment),
        product_name: text(index.product_name),
        customer_id: text(index.customer_id),
        quantity: parse_optional_f64(row.get(index.quantity), line_index, QUANTITY)?,
        unit_price: parse_optional_f64(row.get(index.unit_price), line_index, UNIT_PRICE)?,
        discount_applied: parse_optional_f64(
            row.get(index.discount_applied),
            line_index,
            DISCOUNT_APPLIED,
        )?,
    })
}

/// Strict `DD-MM-YYYY`; chrono alone would also accept single-digit fields.
pub fn parse_day_month_year(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    let bytes = trimmed.as_bytes();
    let well_formed = bytes.len() == 10
        && bytes[2] == b'-'
        && bytes[5] == b'-'
        && bytes
            .iter()
            .enumerate()
            .all(|(pos, b)| pos == 2 || pos == 5 || b.is_ascii_digit());
    if !well_formed {
        return None;
    }

    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).ok()
}

pub(crate) fn parse_date(value: &str, line_index: usize) -> Result<NaiveDate, LoadError> {
    parse_day_month_year(value).ok_or_else(|| LoadError::InvalidDate {
        line_index,
        value: value.trim().to_string(),
    })
}

/// Blank and `NaN` cells are null; anything else must parse as a float.
pub(crate) fn parse_optional_f64(
    value: Option<&str>,
    line_index: usize,
    column: &'static str,
) -> Result<Option<f64>, LoadError> {
    let trimmed = value.unwrap_or_default().trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(|number| (!number.is_nan()).then_some(number))
        .map_err(|_| LoadError::InvalidNumber {
            line_index,
            column,
            value: trimmed.to_string(),
        })
}
