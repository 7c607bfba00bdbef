use grocery_storefront_api::routes::params::{MAX_PAGE, Pagination};

fn normalize(page: Option<i64>, per_page: Option<i64>) -> (i64, i64, i64) {
    Pagination { page, per_page }.normalize()
}

#[test]
fn defaults_to_first_page_of_twenty() {
    assert_eq!(normalize(None, None), (1, 20, 0));
}

#[test]
fn clamps_small_values() {
    assert_eq!(normalize(Some(0), Some(0)), (1, 1, 0));
    assert_eq!(normalize(Some(-5), Some(-5)), (1, 1, 0));
}

#[test]
fn per_page_capped_at_hundred() {
    assert_eq!(normalize(Some(3), Some(500)), (3, 100, 200));
}

#[test]
fn huge_page_stays_in_range() {
    let (page, per_page, offset) = normalize(Some(i64::MAX), Some(100));
    assert_eq!(page, MAX_PAGE);
    assert_eq!(per_page, 100);
    assert_eq!(offset, (MAX_PAGE - 1) * 100);
    assert!(offset >= 0);
}
