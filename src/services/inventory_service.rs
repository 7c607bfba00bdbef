use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{ActiveModelTrait, EntityTrait, QuerySelect, Set, TransactionTrait};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Validate,
        inventory::{AdjustInventoryRequest, LowStockItem, LowStockList},
    },
    entity::inventory::{ActiveModel as InventoryActive, Entity as InventoryEntity, Model as InventoryModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Inventory,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn get_inventory(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<Inventory>> {
    ensure_admin(user)?;
    let inventory = InventoryEntity::find_by_id(product_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Inventory"))?;
    Ok(ApiResponse::success("OK", inventory_from_entity(inventory), None))
}

/// Applies a signed delta and/or a new threshold. Stock never drops below zero.
pub async fn adjust_inventory(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: AdjustInventoryRequest,
) -> AppResult<ApiResponse<Inventory>> {
    ensure_admin(user)?;
    payload.validate()?;

    let txn = state.orm.begin().await?;
    let existing = InventoryEntity::find_by_id(product_id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound("Inventory"))?;

    let previous = existing.quantity;
    let mut active: InventoryActive = existing.into();
    if let Some(delta) = payload.delta {
        let next = previous
            .checked_add(delta)
            .filter(|q| *q >= 0)
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "Adjustment would leave negative stock ({previous} on hand)"
                ))
            })?;
        active.quantity = Set(next);
    }
    if let Some(threshold) = payload.low_stock_threshold {
        active.low_stock_threshold = Set(threshold);
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        product_id = %product_id,
        from = previous,
        to = updated.quantity,
        "inventory adjusted"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "inventory_adjust",
        "inventory",
        serde_json::json!({
            "product_id": product_id,
            "delta": payload.delta,
            "quantity": updated.quantity,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        inventory_from_entity(updated),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct LowStockRow {
    product_id: Uuid,
    quantity: i32,
    low_stock_threshold: i32,
    updated_at: chrono::DateTime<Utc>,
    product_name: String,
}

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<LowStockList>> {
    ensure_admin(user)?;
    let rows = sqlx::query_as::<_, LowStockRow>(
        r#"
        SELECT i.product_id, i.quantity, i.low_stock_threshold, i.updated_at,
               p.name AS product_name
        FROM inventory i
        JOIN products p ON p.id = i.product_id
        WHERE p.is_active AND i.quantity <= i.low_stock_threshold
        ORDER BY i.quantity ASC, p.name ASC
        "#,
    )
    .fetch_all(&state.pool)
    .await?;

    let total = rows.len() as i64;
    let items = rows
        .into_iter()
        .map(|row| LowStockItem {
            inventory: Inventory {
                product_id: row.product_id,
                quantity: row.quantity,
                low_stock_threshold: row.low_stock_threshold,
                is_low_stock: true,
                updated_at: row.updated_at,
            },
            product_name: row.product_name,
        })
        .collect();

    Ok(ApiResponse::success(
        "Low stock",
        LowStockList { items },
        Some(Meta::new(1, total, total)),
    ))
}

fn inventory_from_entity(model: InventoryModel) -> Inventory {
    Inventory {
        product_id: model.product_id,
        is_low_stock: model.quantity <= model.low_stock_threshold,
        quantity: model.quantity,
        low_stock_threshold: model.low_stock_threshold,
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
