use grocery_storefront_api::{
    dto::orders::{CheckoutItem, CheckoutRequest},
    models::{OrderStatus, PaymentMethod, PaymentStatus},
    services::order_service::{merge_items, payment_after},
};
use uuid::Uuid;

use OrderStatus::*;

#[test]
fn happy_path_moves_forward_one_step() {
    assert!(Pending.can_transition_to(Confirmed));
    assert!(Confirmed.can_transition_to(Processing));
    assert!(Processing.can_transition_to(Shipped));
    assert!(Shipped.can_transition_to(Delivered));
}

#[test]
fn skipping_or_going_back_is_rejected() {
    assert!(!Pending.can_transition_to(Shipped));
    assert!(!Shipped.can_transition_to(Processing));
    assert!(!Pending.can_transition_to(Pending));
}

#[test]
fn cancel_only_before_shipping() {
    assert!(Pending.can_transition_to(Cancelled));
    assert!(Confirmed.can_transition_to(Cancelled));
    assert!(Processing.can_transition_to(Cancelled));
    assert!(!Shipped.can_transition_to(Cancelled));
    assert!(!Delivered.can_transition_to(Cancelled));
}

#[test]
fn terminal_states_go_nowhere() {
    for next in [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled] {
        assert!(!Delivered.can_transition_to(next));
        assert!(!Cancelled.can_transition_to(next));
    }
    assert!(Delivered.is_terminal());
    assert!(Cancelled.is_terminal());
    assert!(!Shipped.is_terminal());
}

#[test]
fn status_text_round_trips() {
    for status in [Pending, Confirmed, Processing, Shipped, Delivered, Cancelled] {
        assert_eq!(status.as_str().parse::<OrderStatus>().unwrap(), status);
    }
    assert!("paid".parse::<OrderStatus>().is_err());
}

#[test]
fn cash_on_delivery_is_paid_on_delivery() {
    assert_eq!(
        payment_after(Delivered, PaymentMethod::CashOnDelivery, PaymentStatus::Pending),
        PaymentStatus::Paid
    );
    assert_eq!(
        payment_after(Delivered, PaymentMethod::Card, PaymentStatus::Pending),
        PaymentStatus::Pending
    );
}

#[test]
fn cancelling_paid_order_refunds() {
    assert_eq!(
        payment_after(Cancelled, PaymentMethod::Card, PaymentStatus::Paid),
        PaymentStatus::Refunded
    );
    assert_eq!(
        payment_after(Cancelled, PaymentMethod::CashOnDelivery, PaymentStatus::Pending),
        PaymentStatus::Pending
    );
}

#[test]
fn duplicate_products_are_merged() {
    let apples = Uuid::new_v4();
    let bread = Uuid::new_v4();
    let request = CheckoutRequest {
        items: vec![
            CheckoutItem { product_id: apples, quantity: 2 },
            CheckoutItem { product_id: bread, quantity: 1 },
            CheckoutItem { product_id: apples, quantity: 3 },
        ],
        delivery_address_id: Uuid::new_v4(),
        payment_method: PaymentMethod::CashOnDelivery,
        notes: None,
    };

    let merged = merge_items(&request);
    assert_eq!(merged.len(), 2);
    assert_eq!(merged[&apples], 5);
    assert_eq!(merged[&bread], 1);
}
