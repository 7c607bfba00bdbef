mod common;

use grocery_storefront_api::{
    dto::{
        cart::AddToCartRequest,
        orders::{CheckoutItem, CheckoutRequest, UpdateOrderStatusRequest},
    },
    error::{AppError, CheckoutError},
    middleware::auth::AuthUser,
    models::{OrderStatus, PaymentMethod, PaymentStatus, Role},
    services::{address_service, cart_service, order_service, product_service},
};
use uuid::Uuid;

fn request(address: Uuid, items: &[(Uuid, i32)]) -> CheckoutRequest {
    CheckoutRequest {
        items: items
            .iter()
            .map(|(product_id, quantity)| CheckoutItem {
                product_id: *product_id,
                quantity: *quantity,
            })
            .collect(),
        delivery_address_id: address,
        payment_method: PaymentMethod::CashOnDelivery,
        notes: Some("Dejar en portería".into()),
    }
}

async fn order_count(state: &grocery_storefront_api::state::AppState, user: &AuthUser) -> anyhow::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM orders WHERE user_id = $1")
        .bind(user.user_id)
        .fetch_one(&state.pool)
        .await?;
    Ok(count)
}

#[tokio::test]
async fn checkout_decrements_inventory_and_clears_cart() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let milk = common::create_product(&state, &admin, 1200, 10).await?;
    let bread = common::create_product(&state, &admin, 300, 5).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: milk,
            quantity: 1,
        },
    )
    .await?;

    let resp = order_service::checkout(
        &state,
        &customer,
        request(address, &[(milk, 2), (bread, 1), (milk, 1)]),
    )
    .await?;
    let detail = resp.data.expect("order");

    // 3 x 1200 + 300 = 3900, below the 5000 free-delivery threshold.
    assert_eq!(detail.order.subtotal, 3900);
    assert_eq!(detail.order.delivery_fee, 499);
    assert_eq!(detail.order.total, 4399);
    assert_eq!(detail.order.status, OrderStatus::Pending);
    assert_eq!(detail.order.payment_status, PaymentStatus::Pending);
    assert!(detail.order.order_number.starts_with("ORD-"));
    assert_eq!(detail.items.len(), 2);
    assert_eq!(detail.delivery_address.id, address);

    assert_eq!(common::stock_of(&state, milk).await?, 7);
    assert_eq!(common::stock_of(&state, bread).await?, 4);
    assert_eq!(common::cart_lines(&state, &customer).await?, 0);
    Ok(())
}

#[tokio::test]
async fn insufficient_stock_changes_nothing() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let plenty = common::create_product(&state, &admin, 500, 50).await?;
    let scarce = common::create_product(&state, &admin, 500, 2).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: plenty,
            quantity: 3,
        },
    )
    .await?;

    let err = order_service::checkout(
        &state,
        &customer,
        request(address, &[(plenty, 3), (scarce, 3)]),
    )
    .await
    .unwrap_err();

    match err {
        AppError::Checkout(CheckoutError::InsufficientStock {
            product_id,
            available,
            requested,
            ..
        }) => {
            assert_eq!(product_id, scarce);
            assert_eq!(available, 2);
            assert_eq!(requested, 3);
        }
        other => panic!("expected insufficient stock, got {other:?}"),
    }

    assert_eq!(order_count(&state, &customer).await?, 0);
    assert_eq!(common::stock_of(&state, plenty).await?, 50);
    assert_eq!(common::stock_of(&state, scarce).await?, 2);
    assert_eq!(common::cart_lines(&state, &customer).await?, 1);
    Ok(())
}

#[tokio::test]
async fn foreign_address_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let stranger = common::create_user(&state, Role::Customer).await?;
    let strangers_address = common::create_address(&state, &stranger).await?;
    let product = common::create_product(&state, &admin, 800, 10).await?;

    let err = order_service::checkout(
        &state,
        &customer,
        request(strangers_address, &[(product, 1)]),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::InvalidAddress)));
    assert_eq!(order_count(&state, &customer).await?, 0);
    assert_eq!(common::stock_of(&state, product).await?, 10);
    Ok(())
}

#[tokio::test]
async fn deleted_address_is_rejected() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let product = common::create_product(&state, &admin, 800, 10).await?;
    address_service::delete_address(&state, &customer, address).await?;

    let err = order_service::checkout(&state, &customer, request(address, &[(product, 1)]))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Checkout(CheckoutError::InvalidAddress)));
    assert_eq!(order_count(&state, &customer).await?, 0);
    assert_eq!(common::stock_of(&state, product).await?, 10);
    Ok(())
}

#[tokio::test]
async fn inactive_product_is_unavailable() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let kept = common::create_product(&state, &admin, 400, 10).await?;
    let retired = common::create_product(&state, &admin, 400, 10).await?;

    cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: kept,
            quantity: 2,
        },
    )
    .await?;
    product_service::delete_product(&state, &admin, retired).await?;

    let err = order_service::checkout(
        &state,
        &customer,
        request(address, &[(kept, 2), (retired, 1)]),
    )
    .await
    .unwrap_err();

    assert!(matches!(
        err,
        AppError::Checkout(CheckoutError::ProductUnavailable(id)) if id == retired
    ));
    assert_eq!(order_count(&state, &customer).await?, 0);
    assert_eq!(common::stock_of(&state, kept).await?, 10);
    assert_eq!(common::stock_of(&state, retired).await?, 10);
    assert_eq!(common::cart_lines(&state, &customer).await?, 1);
    Ok(())
}

#[tokio::test]
async fn large_order_ships_free() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let product = common::create_product(&state, &admin, 2500, 10).await?;

    let detail = order_service::checkout(&state, &customer, request(address, &[(product, 2)]))
        .await?
        .data
        .expect("order");

    assert_eq!(detail.order.subtotal, 5000);
    assert_eq!(detail.order.delivery_fee, 0);
    assert_eq!(detail.order.total, 5000);
    Ok(())
}

#[tokio::test]
async fn cancelling_restores_inventory() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let product = common::create_product(&state, &admin, 1000, 8).await?;

    let order = order_service::checkout(&state, &customer, request(address, &[(product, 3)]))
        .await?
        .data
        .expect("order")
        .order;
    assert_eq!(common::stock_of(&state, product).await?, 5);

    let cancelled = order_service::cancel_order(&state, &customer, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(cancelled.order.status, OrderStatus::Cancelled);
    assert_eq!(common::stock_of(&state, product).await?, 8);

    // A terminal order cannot move again.
    let err = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Confirmed,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
    Ok(())
}

#[tokio::test]
async fn admin_walks_order_to_delivery() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let product = common::create_product(&state, &admin, 1500, 4).await?;

    let order = order_service::checkout(&state, &customer, request(address, &[(product, 1)]))
        .await?
        .data
        .expect("order")
        .order;

    let skip = order_service::update_order_status(
        &state,
        &admin,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Shipped,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(skip, AppError::Conflict(_)));

    let mut last = None;
    for status in [
        OrderStatus::Confirmed,
        OrderStatus::Processing,
        OrderStatus::Shipped,
        OrderStatus::Delivered,
    ] {
        last = order_service::update_order_status(
            &state,
            &admin,
            order.id,
            UpdateOrderStatusRequest { status },
        )
        .await?
        .data;
    }
    let delivered = last.expect("order").order;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    assert_eq!(delivered.payment_status, PaymentStatus::Paid);

    // Customers may not drive the status machine.
    let forbidden = order_service::update_order_status(
        &state,
        &customer,
        order.id,
        UpdateOrderStatusRequest {
            status: OrderStatus::Cancelled,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(forbidden, AppError::Forbidden));
    Ok(())
}

#[tokio::test]
async fn customers_only_see_their_own_orders() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let other = common::create_user(&state, Role::Customer).await?;
    let address = common::create_address(&state, &customer).await?;
    let product = common::create_product(&state, &admin, 700, 5).await?;

    let order = order_service::checkout(&state, &customer, request(address, &[(product, 1)]))
        .await?
        .data
        .expect("order")
        .order;

    let err = order_service::get_order(&state, &other, order.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));

    let as_admin = order_service::get_order(&state, &admin, order.id)
        .await?
        .data
        .expect("order");
    assert_eq!(as_admin.order.user_id, customer.user_id);
    Ok(())
}
