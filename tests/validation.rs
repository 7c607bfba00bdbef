use grocery_storefront_api::{
    dto::{
        Validate,
        auth::RegisterRequest,
        cart::AddToCartRequest,
        inventory::AdjustInventoryRequest,
        orders::{CheckoutItem, CheckoutRequest},
        products::{MAX_PRICE, UpdateProductRequest},
        reviews::UpsertReviewRequest,
    },
    error::{AppError, FieldError},
    models::PaymentMethod,
};
use uuid::Uuid;

fn field_errors(result: Result<(), AppError>) -> Vec<FieldError> {
    match result {
        Err(AppError::Validation(errors)) => errors,
        other => panic!("expected validation error, got {other:?}"),
    }
}

fn fields(errors: &[FieldError]) -> Vec<&str> {
    errors.iter().map(|e| e.field.as_str()).collect()
}

fn checkout(items: Vec<CheckoutItem>, notes: Option<String>) -> CheckoutRequest {
    CheckoutRequest {
        items,
        delivery_address_id: Uuid::new_v4(),
        payment_method: PaymentMethod::Card,
        notes,
    }
}

#[test]
fn register_reports_every_bad_field() {
    let request = RegisterRequest {
        email: "not-an-email".into(),
        password: "short".into(),
        first_name: " ".into(),
        last_name: "Pérez".into(),
        phone: None,
    };
    let errors = field_errors(request.validate());
    assert_eq!(fields(&errors), ["email", "password", "first_name"]);
}

#[test]
fn checkout_needs_items() {
    let errors = field_errors(checkout(vec![], None).validate());
    assert_eq!(fields(&errors), ["items"]);
}

#[test]
fn checkout_quantity_bounds() {
    let items = vec![
        CheckoutItem { product_id: Uuid::new_v4(), quantity: 0 },
        CheckoutItem { product_id: Uuid::new_v4(), quantity: 99 },
        CheckoutItem { product_id: Uuid::new_v4(), quantity: 100 },
    ];
    let errors = field_errors(checkout(items, None).validate());
    assert_eq!(fields(&errors), ["items[0].quantity", "items[2].quantity"]);
}

#[test]
fn checkout_notes_limit() {
    let item = || vec![CheckoutItem { product_id: Uuid::new_v4(), quantity: 1 }];
    assert!(checkout(item(), Some("a".repeat(500))).validate().is_ok());

    let errors = field_errors(checkout(item(), Some("a".repeat(501))).validate());
    assert_eq!(fields(&errors), ["notes"]);
}

#[test]
fn cart_quantity_must_be_positive() {
    let request = AddToCartRequest {
        product_id: Uuid::new_v4(),
        quantity: -1,
    };
    assert_eq!(fields(&field_errors(request.validate())), ["quantity"]);
}

#[test]
fn review_rating_range() {
    for rating in [0, 6] {
        let request = UpsertReviewRequest {
            rating,
            comment: None,
        };
        assert!(matches!(request.validate(), Err(AppError::Validation(_))));
    }
    let ok = UpsertReviewRequest {
        rating: 5,
        comment: Some("Muy fresco".into()),
    };
    assert!(ok.validate().is_ok());
}

#[test]
fn inventory_adjustment_needs_something_to_do() {
    let empty = AdjustInventoryRequest {
        delta: None,
        low_stock_threshold: None,
    };
    assert!(empty.validate().is_err());

    let negative_threshold = AdjustInventoryRequest {
        delta: Some(5),
        low_stock_threshold: Some(-1),
    };
    assert_eq!(
        fields(&field_errors(negative_threshold.validate())),
        ["low_stock_threshold"]
    );
}

#[test]
fn product_price_is_bounded() {
    let ok = UpdateProductRequest {
        price: Some(MAX_PRICE),
        ..Default::default()
    };
    assert!(ok.validate().is_ok());

    let too_large = UpdateProductRequest {
        price: Some(MAX_PRICE + 1),
        ..Default::default()
    };
    assert_eq!(fields(&field_errors(too_large.validate())), ["price"]);
}
