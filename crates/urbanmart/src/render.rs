use comfy_table::{ContentArrangement, Table};
use urbanmart_core::{
    DashboardView, FilterOptions, GroupRow, GroupedRevenue, Highlights, Kpis, PreviewRow,
};
use urbanmart_parser::DATE_FORMAT;

pub const NO_DATA_MESSAGE: &str = "No data available for the selected filters.";

fn new_table<S: ToString>(header: &[S]) -> Table {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header.iter().map(ToString::to_string).collect::<Vec<_>>());
    table
}

fn money(value: f64) -> String {
    format!("{value:.2}")
}

pub fn render_kpis(kpis: &Kpis) -> String {
    let mut table = new_table(&["Metric", "Value"]);
    table.add_row(vec!["Total Revenue".to_string(), money(kpis.total_revenue)]);
    table.add_row(vec![
        "Total Transactions".to_string(),
        kpis.transaction_count.to_string(),
    ]);
    table.add_row(vec![
        "Avg Revenue per Transaction".to_string(),
        kpis.average_revenue.to_string(),
    ]);
    table.add_row(vec![
        "Unique Customers".to_string(),
        kpis.unique_customers.to_string(),
    ]);
    table.to_string()
}

pub fn render_highlights(highlights: &Highlights) -> String {
    let mut table = new_table(&["Highlight", "Leader", "Revenue"]);
    let entries = [
        ("Top Category", &highlights.top_category),
        ("Top Store", &highlights.top_store),
        ("Best Day", &highlights.top_day),
        ("Top Product", &highlights.top_product),
        ("Top Customer", &highlights.top_customer),
    ];
    for (label, entry) in entries {
        if let Some(row) = entry {
            table.add_row(vec![label.to_string(), row.key.clone(), money(row.revenue)]);
        }
    }
    table.to_string()
}

pub fn render_group_rows(label: &str, rows: &[GroupRow]) -> String {
    let mut table = new_table(&[label, "Revenue"]);
    for row in rows {
        table.add_row(vec![row.key.clone(), money(row.revenue)]);
    }
    table.to_string()
}

pub fn render_grouped(grouped: &GroupedRevenue) -> String {
    render_group_rows(grouped.key.label(), &grouped.rows)
}

pub fn render_preview(rows: &[PreviewRow]) -> String {
    let mut table = new_table(&[
        "transaction_id",
        "date",
        "store_location",
        "channel",
        "product_category",
        "product_name",
        "customer_segment",
        "customer_id",
        "quantity",
        "unit_price",
        "discount_applied",
        "line_revenue",
        "day_of_week",
        "quarter",
    ]);

    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let number = |value: Option<f64>| value.map(money).unwrap_or_default();

    for row in rows {
        table.add_row(vec![
            text(&row.transaction_id),
            row.date
                .map(|date| date.format(DATE_FORMAT).to_string())
                .unwrap_or_default(),
            text(&row.store_location),
            text(&row.channel),
            text(&row.product_category),
            text(&row.product_name),
            text(&row.customer_segment),
            text(&row.customer_id),
            row.quantity.map(|q| q.to_string()).unwrap_or_default(),
            number(row.unit_price),
            number(row.discount_applied),
            number(row.line_revenue),
            text(&row.day_of_week),
            text(&row.quarter),
        ]);
    }
    table.to_string()
}

pub fn render_dashboard(view: &DashboardView) -> String {
    let sections = [
        ("Key Metrics".to_string(), render_kpis(&view.kpis)),
        ("Highlights".to_string(), render_highlights(&view.highlights)),
        ("Revenue by Category".to_string(), render_grouped(&view.by_category)),
        ("Revenue by Store".to_string(), render_grouped(&view.by_store)),
        ("Revenue by Channel".to_string(), render_grouped(&view.by_channel)),
        ("Revenue by Day of Week".to_string(), render_grouped(&view.by_day_of_week)),
        ("Revenue by Quarter".to_string(), render_grouped(&view.by_quarter)),
        ("Daily Revenue Trend".to_string(), render_grouped(&view.daily_trend)),
        (
            "Top Products".to_string(),
            render_group_rows("Product", &view.top_products),
        ),
        (
            "Top Customers".to_string(),
            render_group_rows("Customer", &view.top_customers),
        ),
        (
            format!("Sample Raw Data ({} of {} rows)", view.preview.len(), view.row_count),
            render_preview(&view.preview),
        ),
    ];

    sections
        .iter()
        .map(|(title, body)| format!("{title}\n{body}"))
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn render_options(options: &FilterOptions) -> String {
    let mut table = new_table(&["Filter", "Choices"]);
    let date_span = options
        .date_bounds
        .map(|range| {
            format!(
                "{} to {}",
                range.start.format(DATE_FORMAT),
                range.end.format(DATE_FORMAT)
            )
        })
        .unwrap_or_else(|| "-".to_string());

    table.add_row(vec!["Date Range".to_string(), date_span]);
    table.add_row(vec!["Store Location".to_string(), options.stores.join(", ")]);
    table.add_row(vec!["Channel".to_string(), options.channel_choices().join(", ")]);
    table.add_row(vec![
        "Product Category".to_string(),
        options.categories.join(", "),
    ]);
    table.add_row(vec![
        "Customer Segment".to_string(),
        options.segments.join(", "),
    ]);
    table.to_string()
}
