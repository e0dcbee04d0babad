pub mod errors;
pub mod model;
mod reader;

pub use errors::{LoadError, TableError};
pub use model::{
    date_to_days, days_to_date, quarter_label, weekday_name, TransactionRecord, TransactionTable,
    REQUIRED_COLUMNS, TABLE_COLUMNS,
};
pub use reader::{load_transactions, parse_day_month_year, parse_transactions, DATE_FORMAT};
