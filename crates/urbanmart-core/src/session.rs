use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use urbanmart_parser::model::{
    CHANNEL, CUSTOMER_ID, CUSTOMER_SEGMENT, DATE, DAY_OF_WEEK, DISCOUNT_APPLIED, LINE_REVENUE,
    PRODUCT_CATEGORY, PRODUCT_NAME, QUANTITY, QUARTER, STORE_LOCATION, TRANSACTION_ID, UNIT_PRICE,
};
use urbanmart_parser::{days_to_date, TableError, TransactionTable};

use crate::error::Result;
use crate::filter::{filter_table, FilterCriteria, FilterOutcome};
use crate::metrics::{
    compute_kpis, grouped_revenue, highlights, top_n, GroupKey, GroupRow, GroupedRevenue,
    Highlights, Kpis, MetricsError, SortOrder, DEFAULT_TOP_N,
};

pub const DEFAULT_PREVIEW_ROWS: usize = 20;

/// Per-chart ordering and sizing for one dashboard render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    pub top_n: usize,
    pub preview_rows: usize,
    pub category_order: SortOrder,
    pub store_order: SortOrder,
    pub channel_order: SortOrder,
    pub day_order: SortOrder,
    pub quarter_order: SortOrder,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            preview_rows: DEFAULT_PREVIEW_ROWS,
            category_order: SortOrder::Ascending,
            store_order: SortOrder::Ascending,
            channel_order: SortOrder::KeyAscending,
            day_order: SortOrder::KeyAscending,
            quarter_order: SortOrder::KeyAscending,
        }
    }
}

/// One line item as shown in the raw-data preview.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreviewRow {
    pub transaction_id: Option<String>,
    pub date: Option<NaiveDate>,
    pub store_location: Option<String>,
    pub channel: Option<String>,
    pub product_category: Option<String>,
    pub customer_segment: Option<String>,
    pub product_name: Option<String>,
    pub customer_id: Option<String>,
    pub quantity: Option<f64>,
    pub unit_price: Option<f64>,
    pub discount_applied: Option<f64>,
    pub line_revenue: Option<f64>,
    pub day_of_week: Option<String>,
    pub quarter: Option<String>,
}

/// Everything a presentation layer renders for one set of criteria.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub criteria: FilterCriteria,
    pub row_count: usize,
    pub kpis: Kpis,
    pub highlights: Highlights,
    pub by_category: GroupedRevenue,
    pub by_store: GroupedRevenue,
    pub by_channel: GroupedRevenue,
    pub by_day_of_week: GroupedRevenue,
    pub by_quarter: GroupedRevenue,
    pub daily_trend: GroupedRevenue,
    pub top_products: Vec<GroupRow>,
    pub top_customers: Vec<GroupRow>,
    pub preview: Vec<PreviewRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Dashboard {
    /// The criteria matched no rows; nothing was aggregated.
    Empty { criteria: FilterCriteria },
    Ready(Box<DashboardView>),
}

impl Dashboard {
    pub fn view(&self) -> Option<&DashboardView> {
        match self {
            Dashboard::Ready(view) => Some(view.as_ref()),
            Dashboard::Empty { .. } => None,
        }
    }
}

/// A user's working state: the shared, read-only base table plus their current criteria.
///
/// Cloning a session shares the table; each clone carries its own criteria.
#[derive(Debug, Clone)]
pub struct Session {
    base: Arc<TransactionTable>,
    criteria: FilterCriteria,
}

impl Session {
    pub fn new(table: TransactionTable) -> Self {
        Self::from_shared(Arc::new(table))
    }

    pub fn from_shared(base: Arc<TransactionTable>) -> Self {
        Self {
            base,
            criteria: FilterCriteria::default(),
        }
    }

    pub fn with_criteria(mut self, criteria: FilterCriteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn base(&self) -> &TransactionTable {
        &self.base
    }

    pub fn shared_base(&self) -> Arc<TransactionTable> {
        Arc::clone(&self.base)
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    pub fn filtered(&self) -> Result<FilterOutcome> {
        Ok(filter_table(&self.base, &self.criteria)?)
    }

    /// Filters and recomputes every aggregate for the current criteria.
    pub fn dashboard(&self, settings: &DashboardSettings) -> Result<Dashboard> {
        let table = match self.filtered()? {
            FilterOutcome::Rows(table) => table,
            FilterOutcome::Empty => {
                warn!(criteria = ?self.criteria, "no data available for the selected filters");
                return Ok(Dashboard::Empty {
                    criteria: self.criteria.clone(),
                });
            }
        };

        let view = DashboardView {
            criteria: self.criteria.clone(),
            row_count: table.height(),
            kpis: compute_kpis(&table)?,
            highlights: highlights(&table)?,
            by_category: grouped_revenue(&table, GroupKey::Category, settings.category_order)?,
            by_store: grouped_revenue(&table, GroupKey::Store, settings.store_order)?,
            by_channel: grouped_revenue(&table, GroupKey::Channel, settings.channel_order)?,
            by_day_of_week: grouped_revenue(&table, GroupKey::DayOfWeek, settings.day_order)?,
            by_quarter: grouped_revenue(&table, GroupKey::Quarter, settings.quarter_order)?,
            daily_trend: grouped_revenue(&table, GroupKey::Date, SortOrder::KeyAscending)?,
            top_products: top_n(&table, GroupKey::Product, settings.top_n)?,
            top_customers: top_n(&table, GroupKey::Customer, settings.top_n)?,
            preview: preview_rows(&table, settings.preview_rows)?,
        };

        info!(
            rows = view.row_count,
            total_revenue = view.kpis.total_revenue,
            "dashboard computed"
        );
        Ok(Dashboard::Ready(Box::new(view)))
    }
}

/// First `rows` line items of the table.
pub fn preview(
    table: &TransactionTable,
    rows: usize,
) -> std::result::Result<TransactionTable, TableError> {
    TransactionTable::from_df(table.df().head(Some(rows)))
}

pub fn preview_rows(
    table: &TransactionTable,
    rows: usize,
) -> std::result::Result<Vec<PreviewRow>, MetricsError> {
    let df = &table.df().head(Some(rows));

    let transaction_id = df.column(TRANSACTION_ID)?.str()?;
    let dates = df.column(DATE)?.date()?;
    let store = df.column(STORE_LOCATION)?.str()?;
    let channel = df.column(CHANNEL)?.str()?;
    let category = df.column(PRODUCT_CATEGORY)?.str()?;
    let segment = df.column(CUSTOMER_SEGMENT)?.str()?;
    let product = df.column(PRODUCT_NAME)?.str()?;
    let customer = df.column(CUSTOMER_ID)?.str()?;
    let quantity = df.column(QUANTITY)?.f64()?;
    let unit_price = df.column(UNIT_PRICE)?.f64()?;
    let discount = df.column(DISCOUNT_APPLIED)?.f64()?;
    let revenue = df.column(LINE_REVENUE)?.f64()?;
    let weekday = df.column(DAY_OF_WEEK)?.str()?;
    let quarter = df.column(QUARTER)?.str()?;

    let owned = |value: Option<&str>| value.map(str::to_string);

    let mut out = Vec::with_capacity(df.height());
    for idx in 0..df.height() {
        out.push(PreviewRow {
            transaction_id: owned(transaction_id.get(idx)),
            date: dates.get(idx).and_then(days_to_date),
            store_location: owned(store.get(idx)),
            channel: owned(channel.get(idx)),
            product_category: owned(category.get(idx)),
            customer_segment: owned(segment.get(idx)),
            product_name: owned(product.get(idx)),
            customer_id: owned(customer.get(idx)),
            quantity: quantity.get(idx),
            unit_price: unit_price.get(idx),
            discount_applied: discount.get(idx),
            line_revenue: revenue.get(idx),
            day_of_week: owned(weekday.get(idx)),
            quarter: owned(quarter.get(idx)),
        });
    }

    debug!(rows = out.len(), "built preview");
    Ok(out)
}
