mod common;

use grocery_storefront_api::{
    dto::cart::{AddToCartRequest, UpdateCartItemRequest},
    error::AppError,
    models::Role,
    services::cart_service,
};

#[tokio::test]
async fn adding_twice_increments_quantity() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let product = common::create_product(&state, &admin, 450, 20).await?;

    let add = |quantity| AddToCartRequest {
        product_id: product,
        quantity,
    };
    let first = cart_service::add_to_cart(&state, &customer, add(2)).await?.data.expect("item");
    let second = cart_service::add_to_cart(&state, &customer, add(3)).await?.data.expect("item");

    assert_eq!(first.id, second.id);
    assert_eq!(second.quantity, 5);
    assert_eq!(common::cart_lines(&state, &customer).await?, 1);

    let view = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.item_count, 5);
    assert_eq!(view.subtotal, 2250);
    assert_eq!(view.delivery_fee, 499);
    assert_eq!(view.total, 2749);
    assert_eq!(view.items[0].available_stock, 20);
    Ok(())
}

#[tokio::test]
async fn cannot_add_more_than_in_stock() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let product = common::create_product(&state, &admin, 100, 2).await?;

    let err = cart_service::add_to_cart(
        &state,
        &customer,
        AddToCartRequest {
            product_id: product,
            quantity: 3,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(common::cart_lines(&state, &customer).await?, 0);
    Ok(())
}

#[tokio::test]
async fn update_remove_and_clear() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let apples = common::create_product(&state, &admin, 200, 10).await?;
    let pears = common::create_product(&state, &admin, 250, 10).await?;

    for product_id in [apples, pears] {
        cart_service::add_to_cart(
            &state,
            &customer,
            AddToCartRequest {
                product_id,
                quantity: 1,
            },
        )
        .await?;
    }

    let updated = cart_service::update_cart_item(
        &state,
        &customer,
        apples,
        UpdateCartItemRequest { quantity: 4 },
    )
    .await?
    .data
    .expect("item");
    assert_eq!(updated.quantity, 4);

    cart_service::remove_from_cart(&state, &customer, pears).await?;
    assert_eq!(common::cart_lines(&state, &customer).await?, 1);

    let missing = cart_service::remove_from_cart(&state, &customer, pears)
        .await
        .unwrap_err();
    assert!(matches!(missing, AppError::NotFound(_)));

    cart_service::clear_cart(&state, &customer).await?;
    let view = cart_service::get_cart(&state, &customer).await?.data.expect("cart");
    assert!(view.items.is_empty());
    assert_eq!(view.total, 0);
    Ok(())
}

#[tokio::test]
async fn concurrent_adds_respect_line_limit() -> anyhow::Result<()> {
    let Some(state) = common::db_state().await? else {
        return Ok(());
    };
    let admin = common::create_user(&state, Role::Admin).await?;
    let customer = common::create_user(&state, Role::Customer).await?;
    let product = common::create_product(&state, &admin, 100, 500).await?;

    let add = || AddToCartRequest {
        product_id: product,
        quantity: 60,
    };
    let (a, b) = tokio::join!(
        cart_service::add_to_cart(&state, &customer, add()),
        cart_service::add_to_cart(&state, &customer, add()),
    );
    assert_eq!([a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count(), 1);

    let (quantity,): (i32,) =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(customer.user_id)
            .bind(product)
            .fetch_one(&state.pool)
            .await?;
    assert_eq!(quantity, 60);
    Ok(())
}
