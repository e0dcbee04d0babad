mod common;

use common::{sample_table, table, ymd};
use urbanmart_core::{apply_filters, filter_options, DateRange, FilterCriteria};

#[test]
fn options_list_distinct_values_in_first_appearance_order() {
    let options = filter_options(&sample_table()).unwrap();

    assert_eq!(options.stores, ["Downtown", "Uptown", "Suburb"]);
    assert_eq!(options.channels, ["In-store", "Online"]);
    assert_eq!(
        options.categories,
        ["Grocery", "Snacks", "Beverages", "Personal Care"]
    );
    assert_eq!(options.segments, ["Regular", "Student", "Premium"]);
    assert_eq!(
        options.date_bounds,
        Some(DateRange::new(ymd(2024, 1, 1), ymd(2024, 10, 1)))
    );
}

#[test]
fn channel_choices_lead_with_sentinel() {
    let options = filter_options(&sample_table()).unwrap();
    assert_eq!(options.channel_choices(), ["All", "In-store", "Online"]);
}

#[test]
fn default_criteria_cover_everything() {
    let base = sample_table();
    let options = filter_options(&base).unwrap();
    let criteria = options.default_criteria();

    assert!(!criteria.is_unrestricted());
    assert!(criteria.stores.is_empty());
    let filtered = apply_filters(&base, &criteria).unwrap();
    assert_eq!(filtered.height(), base.height());
}

#[test]
fn empty_table_has_no_date_bounds() {
    let options = filter_options(&table(&[])).unwrap();
    assert!(options.date_bounds.is_none());
    assert!(options.stores.is_empty());
    assert_eq!(options.default_criteria(), FilterCriteria::default());
}
