use grocery_storefront_api::{
    config::AppConfig,
    error::AppError,
    services::pricing::{DeliveryPolicy, Totals, line_total},
};

fn policy() -> DeliveryPolicy {
    DeliveryPolicy::from_config(&AppConfig::for_tests("postgres://unused"))
}

#[test]
fn fee_charged_below_threshold() {
    let totals = policy().totals([(1250, 2), (999, 1)]).unwrap();
    assert_eq!(
        totals,
        Totals {
            subtotal: 3499,
            delivery_fee: 499,
            total: 3998,
        }
    );
}

#[test]
fn delivery_free_at_threshold() {
    let totals = policy().totals([(2500, 2)]).unwrap();
    assert_eq!(totals.subtotal, 5000);
    assert_eq!(totals.delivery_fee, 0);
    assert_eq!(totals.total, 5000);
}

#[test]
fn one_cent_short_of_free_delivery() {
    assert_eq!(policy().fee_for(4999), 499);
    assert_eq!(policy().fee_for(5000), 0);
}

#[test]
fn empty_basket_costs_nothing() {
    let totals = policy().totals(std::iter::empty()).unwrap();
    assert_eq!(totals.total, 0);
    assert_eq!(totals.delivery_fee, 0);
}

#[test]
fn custom_policy_is_respected() {
    let policy = DeliveryPolicy {
        free_threshold: 10_000,
        flat_fee: 750,
    };
    let totals = policy.totals([(6000, 1)]).unwrap();
    assert_eq!(totals.delivery_fee, 750);
    assert_eq!(totals.total, totals.subtotal + totals.delivery_fee);
}

#[test]
fn line_total_does_not_overflow_i32() {
    assert_eq!(line_total(3_000_000_000, 2).unwrap(), 6_000_000_000);
}

#[test]
fn oversized_line_is_rejected() {
    let err = policy().totals([(i64::MAX / 2, 3)]).unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert!(matches!(line_total(i64::MAX, 2), Err(AppError::BadRequest(_))));
}

#[test]
fn oversized_subtotal_is_rejected() {
    let err = policy()
        .totals([(i64::MAX / 2, 1), (i64::MAX / 2, 1), (i64::MAX / 2, 1)])
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}
