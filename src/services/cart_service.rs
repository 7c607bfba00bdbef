use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::{
        Validate,
        cart::{AddToCartRequest, CartItemDto, CartView, MAX_LINE_QUANTITY, UpdateCartItemRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, ProductSummary},
    response::{ApiResponse, Meta},
    services::pricing::{DeliveryPolicy, line_total},
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    unit: String,
    image_url: Option<String>,
    price: i64,
    is_active: bool,
    stock: i32,
}

#[derive(FromRow)]
struct ProductStockRow {
    name: String,
    stock: i32,
}

async fn active_product_stock(pool: &DbPool, product_id: Uuid) -> AppResult<ProductStockRow> {
    let row: Option<ProductStockRow> = sqlx::query_as(
        r#"
        SELECT p.name, COALESCE(i.quantity, 0) AS stock
        FROM products p
        LEFT JOIN inventory i ON i.product_id = p.id
        WHERE p.id = $1 AND p.is_active
        "#,
    )
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    row.ok_or(AppError::NotFound("Product"))
}

fn ensure_stock(product: &ProductStockRow, wanted: i32) -> AppResult<()> {
    if product.stock < wanted {
        return Err(AppError::BadRequest(format!(
            "Only {} units of {} available",
            product.stock, product.name
        )));
    }
    Ok(())
}

pub async fn get_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id AS product_id, p.name, p.unit, p.image_url, p.price, p.is_active,
               COALESCE(i.quantity, 0) AS stock
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        LEFT JOIN inventory i ON i.product_id = p.id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let policy = DeliveryPolicy::from_config(&state.config);
    let totals = policy.totals(
        rows.iter()
            .filter(|row| row.is_active)
            .map(|row| (row.price, row.quantity)),
    )?;

    let items: Vec<CartItemDto> = rows
        .into_iter()
        .map(|row| -> AppResult<CartItemDto> {
            Ok(CartItemDto {
                id: row.cart_id,
                unit_price: row.price,
                quantity: row.quantity,
                line_total: line_total(row.price, row.quantity)?,
                available_stock: if row.is_active { row.stock } else { 0 },
                product: ProductSummary {
                    id: row.product_id,
                    name: row.name,
                    unit: row.unit.parse()?,
                    image_url: row.image_url,
                },
            })
        })
        .collect::<AppResult<_>>()?;

    let item_count = items.iter().map(|i| i64::from(i.quantity)).sum();
    let view = CartView {
        items,
        item_count,
        subtotal: totals.subtotal,
        delivery_fee: totals.delivery_fee,
        total: totals.total,
    };
    Ok(ApiResponse::success("OK", view, Some(Meta::empty())))
}

fn line_limit_exceeded() -> AppError {
    AppError::BadRequest(format!("At most {MAX_LINE_QUANTITY} units per product"))
}

/// Adding a product already in the cart increases its quantity.
pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;
    let product = active_product_stock(&state.pool, payload.product_id).await?;

    let current: Option<(i32,)> =
        sqlx::query_as("SELECT quantity FROM cart_items WHERE user_id = $1 AND product_id = $2")
            .bind(user.user_id)
            .bind(payload.product_id)
            .fetch_optional(&state.pool)
            .await?;
    let wanted = current.map_or(0, |(q,)| q) + payload.quantity;
    if wanted > MAX_LINE_QUANTITY {
        return Err(line_limit_exceeded());
    }
    ensure_stock(&product, wanted)?;

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity, updated_at = NOW()
        WHERE cart_items.quantity + EXCLUDED.quantity <= $5
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .bind(payload.quantity)
    .bind(MAX_LINE_QUANTITY)
    .fetch_optional(&state.pool)
    .await?
    // A concurrent add filled the line between the read above and this upsert.
    .ok_or_else(line_limit_exceeded)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": cart_item.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", cart_item, None))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    payload.validate()?;
    let product = active_product_stock(&state.pool, product_id).await?;
    ensure_stock(&product, payload.quantity)?;

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3, updated_at = NOW()
        WHERE user_id = $1 AND product_id = $2
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound("Cart item"))?;

    Ok(ApiResponse::success("Cart updated", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Cart item"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
