mod common;

use std::sync::Arc;
use std::thread;

use common::{assert_close, fixture_path, sample_table, ymd};
use urbanmart_core::session::preview_rows;
use urbanmart_core::{
    filter_options, preview, Dashboard, DashboardSettings, FilterCriteria, FilterOutcome,
    SortOrder, Session,
};
use urbanmart_parser::load_transactions;

#[test]
fn dashboard_recomputes_for_current_criteria() {
    let mut session = Session::new(sample_table());
    let settings = DashboardSettings::default();

    let full = session.dashboard(&settings).unwrap();
    let view = full.view().expect("expected data");
    assert_eq!(view.row_count, 10);
    assert_close(view.kpis.total_revenue, 144.0);
    assert_eq!(view.top_products.len(), 5);
    assert_eq!(view.preview.len(), 10);

    session.set_criteria(FilterCriteria::default().with_stores(["Downtown"]));
    let downtown = session.dashboard(&settings).unwrap();
    let view = downtown.view().expect("expected data");
    assert_eq!(view.row_count, 4);
    assert_close(view.kpis.total_revenue, 87.5);
    assert_eq!(view.kpis.transaction_count, 3);
    assert_eq!(view.by_store.rows.len(), 1);
    assert_eq!(view.criteria, *session.criteria());

    // The base table is never replaced by a filtered view.
    assert_eq!(session.base().height(), 10);
}

#[test]
fn dashboard_uses_configured_orders() {
    let settings = DashboardSettings {
        store_order: SortOrder::Descending,
        category_order: SortOrder::Natural,
        top_n: 2,
        preview_rows: 3,
        ..DashboardSettings::default()
    };
    let dashboard = Session::new(sample_table()).dashboard(&settings).unwrap();
    let view = dashboard.view().unwrap();

    let stores: Vec<&str> = view.by_store.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(stores, ["Downtown", "Uptown", "Suburb"]);
    let categories: Vec<&str> = view.by_category.rows.iter().map(|r| r.key.as_str()).collect();
    assert_eq!(categories, ["Grocery", "Snacks", "Beverages", "Personal Care"]);
    assert_eq!(view.top_customers.len(), 2);
    assert_eq!(view.preview.len(), 3);
    assert_eq!(view.daily_trend.rows.first().unwrap().key, "2024-01-01");
}

#[test]
fn default_settings_match_dashboard_layout() {
    let settings = DashboardSettings::default();
    assert_eq!(settings.top_n, 5);
    assert_eq!(settings.preview_rows, 20);
    assert_eq!(settings.category_order, SortOrder::Ascending);
    assert_eq!(settings.store_order, SortOrder::Ascending);

    let parsed: DashboardSettings = toml::from_str("store_order = \"descending\"").unwrap();
    assert_eq!(parsed.store_order, SortOrder::Descending);
    assert_eq!(parsed.top_n, 5);
}

#[test]
fn empty_filter_result_is_a_state_not_an_error() {
    let session = Session::new(sample_table()).with_criteria(
        FilterCriteria::default().with_date_range(ymd(2020, 1, 1), ymd(2020, 12, 31)),
    );

    assert!(matches!(session.filtered().unwrap(), FilterOutcome::Empty));

    let dashboard = session.dashboard(&DashboardSettings::default()).unwrap();
    assert!(dashboard.view().is_none());
    match &dashboard {
        Dashboard::Empty { criteria } => assert_eq!(criteria, session.criteria()),
        Dashboard::Ready(_) => panic!("expected the empty state"),
    }

    let json = serde_json::to_value(&dashboard).unwrap();
    assert_eq!(json["status"], "empty");
}

#[test]
fn repeated_calls_are_identical() {
    let session = Session::new(sample_table())
        .with_criteria(FilterCriteria::default().with_channel("Online"));
    let settings = DashboardSettings::default();

    assert_eq!(
        session.dashboard(&settings).unwrap(),
        session.dashboard(&settings).unwrap()
    );
}

#[test]
fn sessions_share_the_base_table_read_only() {
    let base = Arc::new(sample_table());
    let handles: Vec<_> = ["Downtown", "Uptown", "Suburb"]
        .into_iter()
        .map(|store| {
            let session = Session::from_shared(Arc::clone(&base))
                .with_criteria(FilterCriteria::default().with_stores([store]));
            assert!(Arc::ptr_eq(&session.shared_base(), &base));
            thread::spawn(move || {
                let dashboard = session.dashboard(&DashboardSettings::default()).unwrap();
                dashboard.view().map(|view| view.kpis.total_revenue)
            })
        })
        .collect();

    let totals: Vec<f64> = handles
        .into_iter()
        .map(|handle| handle.join().unwrap().unwrap())
        .collect();
    assert_close(totals.iter().sum(), 144.0);
    assert_eq!(base.height(), 10);
}

#[test]
fn preview_takes_leading_rows() {
    let base = sample_table();

    let head = preview(&base, 3).unwrap();
    assert_eq!(head.height(), 3);
    assert_eq!(preview(&base, 50).unwrap().height(), 10);

    let rows = preview_rows(&base, 2).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].transaction_id.as_deref(), Some("T1001"));
    assert_eq!(rows[0].date, Some(ymd(2024, 1, 1)));
    assert_eq!(rows[0].line_revenue, Some(19.0));
    assert_eq!(rows[1].day_of_week.as_deref(), Some("Monday"));
}

#[test]
fn options_seed_the_initial_session() {
    let table = load_transactions(fixture_path("transactions_sample.csv")).unwrap();
    let options = filter_options(&table).unwrap();

    let session = Session::new(table).with_criteria(options.default_criteria());
    let view_rows = session
        .dashboard(&DashboardSettings::default())
        .unwrap()
        .view()
        .map(|view| view.row_count);
    assert_eq!(view_rows, Some(10));
}

#[test]
fn dashboard_serializes_to_json() {
    let dashboard = Session::new(sample_table())
        .dashboard(&DashboardSettings::default())
        .unwrap();
    let json = serde_json::to_value(&dashboard).unwrap();

    assert_eq!(json["status"], "ready");
    assert_eq!(json["row_count"], 10);
    assert_eq!(json["by_category"]["key"], "category");
    assert_eq!(json["top_products"][0]["key"], "Organic Milk");
    assert_eq!(json["preview"][0]["date"], "2024-01-01");
    assert_eq!(json["criteria"]["channel"], "All");
}
