use std::collections::{HashMap, HashSet};
use std::fmt;

use polars::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use tracing::debug;
use urbanmart_parser::model::{
    CHANNEL, CUSTOMER_ID, DATE, DAY_OF_WEEK, LINE_REVENUE, PRODUCT_CATEGORY, PRODUCT_NAME,
    QUARTER, STORE_LOCATION, TRANSACTION_ID,
};
use urbanmart_parser::{days_to_date, TransactionTable};

pub const DEFAULT_TOP_N: usize = 5;

const WEEKDAYS: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("polars operation failed: {0}")]
    Polars(#[from] PolarsError),
    #[error("date value {days} is outside the supported calendar range")]
    DateOutOfRange { days: i32 },
}

/// A statistic that may be undefined for its input, such as a mean over zero rows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    Value(f64),
    NotApplicable,
}

impl Aggregate {
    pub fn value(&self) -> Option<f64> {
        match self {
            Aggregate::Value(value) => Some(*value),
            Aggregate::NotApplicable => None,
        }
    }

    pub fn is_applicable(&self) -> bool {
        matches!(self, Aggregate::Value(_))
    }
}

impl fmt::Display for Aggregate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Aggregate::Value(value) => write!(f, "{value:.2}"),
            Aggregate::NotApplicable => f.write_str("n/a"),
        }
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.value().serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    /// Distinct `transaction_id` values.
    pub transaction_count: usize,
    /// Mean of `line_revenue` over line items, not over per-transaction totals.
    pub average_revenue: Aggregate,
    pub unique_customers: usize,
}

/// Categorical dimension used to partition rows before summing revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Category,
    Store,
    Channel,
    DayOfWeek,
    Quarter,
    Product,
    Customer,
    Date,
}

impl GroupKey {
    pub fn column(&self) -> &'static str {
        match self {
            GroupKey::Category => PRODUCT_CATEGORY,
            GroupKey::Store => STORE_LOCATION,
            GroupKey::Channel => CHANNEL,
            GroupKey::DayOfWeek => DAY_OF_WEEK,
            GroupKey::Quarter => QUARTER,
            GroupKey::Product => PRODUCT_NAME,
            GroupKey::Customer => CUSTOMER_ID,
            GroupKey::Date => DATE,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            GroupKey::Category => "Category",
            GroupKey::Store => "Store",
            GroupKey::Channel => "Channel",
            GroupKey::DayOfWeek => "Day of Week",
            GroupKey::Quarter => "Quarter",
            GroupKey::Product => "Product",
            GroupKey::Customer => "Customer",
            GroupKey::Date => "Date",
        }
    }

    /// Row-aligned key strings; `None` where the cell is null.
    fn values(&self, df: &DataFrame) -> Result<Vec<Option<String>>, MetricsError> {
        let column = df.column(self.column())?;
        if *self == GroupKey::Date {
            let dates = column.date()?;
            return (0..df.height())
                .map(|idx| match dates.get(idx) {
                    Some(days) => days_to_date(days)
                        .map(|date| Some(date.format("%Y-%m-%d").to_string()))
                        .ok_or(MetricsError::DateOutOfRange { days }),
                    None => Ok(None),
                })
                .collect();
        }

        let values = column.str()?;
        Ok((0..df.height())
            .map(|idx| values.get(idx).map(str::to_string))
            .collect())
    }
}

/// Row order of a grouped result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    /// Smallest revenue first.
    Ascending,
    /// Largest revenue first.
    Descending,
    /// First appearance of each key in the input.
    #[default]
    Natural,
    /// By key: calendar order for weekdays, chronological for dates and quarters,
    /// lexicographic otherwise.
    KeyAscending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupRow {
    pub key: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupedRevenue {
    pub key: GroupKey,
    pub rows: Vec<GroupRow>,
}

impl GroupedRevenue {
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|row| row.revenue).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Highest-revenue entry; the earliest listed wins a tie.
    pub fn top(&self) -> Option<&GroupRow> {
        self.rows.iter().fold(None, |best: Option<&GroupRow>, row| match best {
            Some(current) if current.revenue >= row.revenue => Some(current),
            _ => Some(row),
        })
    }
}

pub fn compute_kpis(table: &TransactionTable) -> Result<Kpis, MetricsError> {
    let df = table.df();
    let len = df.height();

    let revenue = df.column(LINE_REVENUE)?.f64()?;
    let transactions = df.column(TRANSACTION_ID)?.str()?;
    let customers = df.column(CUSTOMER_ID)?.str()?;

    let mut total_revenue = 0.0;
    let mut revenue_rows = 0usize;
    let mut transaction_ids: HashSet<&str> = HashSet::new();
    let mut customer_ids: HashSet<&str> = HashSet::new();

    for idx in 0..len {
        if let Some(value) = revenue.get(idx) {
            total_revenue += value;
            revenue_rows += 1;
        }
        if let Some(id) = transactions.get(idx) {
            transaction_ids.insert(id);
        }
        if let Some(id) = customers.get(idx) {
            customer_ids.insert(id);
        }
    }

    let average_revenue = if revenue_rows == 0 {
        Aggregate::NotApplicable
    } else {
        Aggregate::Value(total_revenue / revenue_rows as f64)
    };

    Ok(Kpis {
        total_revenue,
        transaction_count: transaction_ids.len(),
        average_revenue,
        unique_customers: customer_ids.len(),
    })
}

/// Sums `line_revenue` per distinct key present in the table. No zero-filled groups.
pub fn grouped_revenue(
    table: &TransactionTable,
    key: GroupKey,
    order: SortOrder,
) -> Result<GroupedRevenue, MetricsError> {
    let df = table.df();
    let keys = key.values(df)?;
    let revenue = df.column(LINE_REVENUE)?.f64()?;

    let mut rows: Vec<GroupRow> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (idx, group) in keys.into_iter().enumerate() {
        let Some(group) = group else {
            continue;
        };
        let value = revenue.get(idx).unwrap_or(0.0);
        match positions.get(&group) {
            Some(&position) => rows[position].revenue += value,
            None => {
                positions.insert(group.clone(), rows.len());
                rows.push(GroupRow {
                    key: group,
                    revenue: value,
                });
            }
        }
    }

    // total_cmp orders -0.0 before 0.0; normalise so equal sums stay tied.
    for row in &mut rows {
        row.revenue += 0.0;
    }

    // All sorts are stable, so equal values keep first-appearance order.
    match order {
        SortOrder::Ascending => rows.sort_by(|a, b| a.revenue.total_cmp(&b.revenue)),
        SortOrder::Descending => rows.sort_by(|a, b| b.revenue.total_cmp(&a.revenue)),
        SortOrder::Natural => {}
        SortOrder::KeyAscending if key == GroupKey::DayOfWeek => {
            rows.sort_by_key(|row| weekday_rank(&row.key))
        }
        SortOrder::KeyAscending => rows.sort_by(|a, b| a.key.cmp(&b.key)),
    }

    debug!(key = key.column(), groups = rows.len(), "grouped revenue");
    Ok(GroupedRevenue { key, rows })
}

fn weekday_rank(name: &str) -> usize {
    WEEKDAYS
        .iter()
        .position(|day| *day == name)
        .unwrap_or(WEEKDAYS.len())
}

/// The `n` highest-revenue groups, descending. Ties keep first-appearance order.
pub fn top_n(
    table: &TransactionTable,
    key: GroupKey,
    n: usize,
) -> Result<Vec<GroupRow>, MetricsError> {
    let mut grouped = grouped_revenue(table, key, SortOrder::Descending)?;
    grouped.rows.truncate(n);
    Ok(grouped.rows)
}

/// Best-earning entry per dimension, shown as callouts above the charts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Highlights {
    pub top_category: Option<GroupRow>,
    pub top_store: Option<GroupRow>,
    pub top_day: Option<GroupRow>,
    pub top_product: Option<GroupRow>,
    pub top_customer: Option<GroupRow>,
}

pub fn highlights(table: &TransactionTable) -> Result<Highlights, MetricsError> {
    let best = |key| -> Result<Option<GroupRow>, MetricsError> {
        Ok(top_n(table, key, 1)?.into_iter().next())
    };

    Ok(Highlights {
        top_category: best(GroupKey::Category)?,
        top_store: best(GroupKey::Store)?,
        top_day: best(GroupKey::DayOfWeek)?,
        top_product: best(GroupKey::Product)?,
        top_customer: best(GroupKey::Customer)?,
    })
}
