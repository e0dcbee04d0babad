#![allow(dead_code)]

use std::path::PathBuf;

use chrono::NaiveDate;
use urbanmart_parser::{load_transactions, TransactionRecord, TransactionTable};

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../urbanmart-parser/tests/data")
        .join(name)
}

pub fn sample_table() -> TransactionTable {
    load_transactions(fixture_path("transactions_sample.csv")).expect("failed to load fixture")
}

pub fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn record(id: &str, quantity: i64, unit_price: f64, discount: f64, store: &str) -> TransactionRecord {
    TransactionRecord {
        transaction_id: id.to_string(),
        date: ymd(2024, 1, 1),
        store_location: store.to_string(),
        channel: "Online".to_string(),
        product_category: "Grocery".to_string(),
        customer_segment: "Regular".to_string(),
        product_name: format!("Product {id}"),
        customer_id: format!("C{id}"),
        quantity: Some(quantity as f64),
        unit_price: Some(unit_price),
        discount_applied: Some(discount),
    }
}

pub fn table(records: &[TransactionRecord]) -> TransactionTable {
    TransactionTable::from_records(records).expect("failed to build table")
}

pub fn column_strings(table: &TransactionTable, column: &str) -> Vec<String> {
    let values = table.df().column(column).unwrap().str().unwrap();
    (0..table.height())
        .map(|idx| values.get(idx).unwrap_or_default().to_string())
        .collect()
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}
