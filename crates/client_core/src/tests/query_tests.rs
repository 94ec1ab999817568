use super::*;

#[test]
fn filter_change_returns_to_first_page() {
    let mut query = ListQuery::default();
    query.set_text("ali");
    query.set_page(3);
    assert_eq!(query.page, 3);

    query.set_status(Some(ClientStatus::Active));
    assert_eq!(query.page, 1);
    assert_eq!(query.text, "ali");
    assert_eq!(query.status, Some(ClientStatus::Active));
}

#[test]
fn every_shape_change_resets_page() {
    let changes: Vec<Box<dyn Fn(&mut ListQuery)>> = vec![
        Box::new(|q| q.set_payment(Some(PaymentStatus::Paid))),
        Box::new(|q| q.set_course("Frontend")),
        Box::new(|q| q.set_sort(SortColumn::FullName)),
        Box::new(|q| q.set_order(SortDirection::Asc)),
        Box::new(|q| q.toggle_sort(SortColumn::Status)),
        Box::new(|q| q.set_page_size(20)),
    ];
    for change in changes {
        let mut query = ListQuery::default();
        query.set_page(4);
        change(&mut query);
        assert_eq!(query.page, 1);
    }
}

#[test]
fn committing_same_text_keeps_page() {
    let mut query = ListQuery::default();
    assert!(query.set_text("  ali "));
    assert_eq!(query.text, "ali");
    query.set_page(2);

    assert!(!query.set_text("ali  "));
    assert_eq!(query.page, 2);
}

#[test]
fn toggle_sort_flips_active_column_and_defaults_new_one() {
    let mut query = ListQuery::default();
    assert_eq!(
        (query.sort, query.order),
        (SortColumn::CreatedAt, SortDirection::Desc)
    );

    query.toggle_sort(SortColumn::CreatedAt);
    assert_eq!(query.order, SortDirection::Asc);

    query.toggle_sort(SortColumn::FullName);
    assert_eq!(
        (query.sort, query.order),
        (SortColumn::FullName, SortDirection::Asc)
    );

    query.toggle_sort(SortColumn::PaymentStatus);
    assert_eq!(
        (query.sort, query.order),
        (SortColumn::PaymentStatus, SortDirection::Desc)
    );
}

#[test]
fn reset_keeps_page_size() {
    let mut query = ListQuery::with_page_size(20);
    query.set_text("x");
    query.set_status(Some(ClientStatus::Inactive));
    query.toggle_sort(SortColumn::FullName);
    query.set_page(5);

    query.reset();
    assert_eq!(query, ListQuery::with_page_size(20));
}

#[test]
fn params_skip_blank_filters_and_export_drops_paging() {
    let mut query = ListQuery::default();
    query.set_course("   ");
    query.set_page(2);
    let params = query.to_params();
    assert_eq!(params.q, None);
    assert_eq!(params.course, None);
    assert_eq!(params.page, Some(2));
    assert_eq!(params.limit, Some(DEFAULT_PAGE_SIZE));

    query.set_text("ali");
    query.set_payment(Some(PaymentStatus::Unpaid));
    let export = query.export_params();
    assert_eq!(export.q.as_deref(), Some("ali"));
    assert_eq!(export.payment_status, Some(PaymentStatus::Unpaid));
    assert_eq!(export.page, None);
    assert_eq!(export.limit, None);
}

#[test]
fn page_size_never_drops_below_one() {
    let mut query = ListQuery::with_page_size(0);
    assert_eq!(query.page_size, 1);
    query.set_page_size(0);
    assert_eq!(query.page_size, 1);
    query.set_page(0);
    assert_eq!(query.page, 1);
}

#[test]
fn page_count_has_floor_of_one() {
    assert_eq!(page_count(0, 10), 1);
    assert_eq!(page_count(10, 10), 1);
    assert_eq!(page_count(11, 10), 2);
    assert_eq!(page_count(95, 20), 5);
}

#[test]
fn range_text_covers_partial_last_page() {
    assert_eq!(range_text(1, 10, 0), "0–0");
    assert_eq!(range_text(1, 10, 42), "1–10");
    assert_eq!(range_text(5, 10, 42), "41–42");
}
