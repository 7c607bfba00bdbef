use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use sea_orm::ActiveValue::NotSet;
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Validate,
        addresses::{AddressList, CreateAddressRequest, UpdateAddressRequest},
    },
    entity::addresses::{ActiveModel as AddressActive, Column, Entity as Addresses, Model as AddressModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Address,
    response::{ApiResponse, Meta},
    state::AppState,
};

fn owned_active(user_id: Uuid, id: Uuid) -> Condition {
    Condition::all()
        .add(Column::Id.eq(id))
        .add(Column::UserId.eq(user_id))
        .add(Column::DeletedAt.is_null())
}

/// Load an address only if it belongs to `user_id` and is not soft-deleted.
pub async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    id: Uuid,
) -> AppResult<Option<AddressModel>> {
    Ok(Addresses::find()
        .filter(owned_active(user_id, id))
        .one(conn)
        .await?)
}

async fn clear_default<C: ConnectionTrait>(conn: &C, user_id: Uuid) -> AppResult<()> {
    Addresses::update_many()
        .col_expr(Column::IsDefault, Expr::value(false))
        .filter(Column::UserId.eq(user_id))
        .filter(Column::IsDefault.eq(true))
        .exec(conn)
        .await?;
    Ok(())
}

pub async fn list_addresses(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<AddressList>> {
    let items = Addresses::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::DeletedAt.is_null())
        .order_by_desc(Column::IsDefault)
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(address_from_entity)
        .collect::<Vec<_>>();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "OK",
        AddressList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let address = find_owned(&state.orm, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("Address"))?;
    Ok(ApiResponse::success("OK", address_from_entity(address), None))
}

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let txn = state.orm.begin().await?;

    let existing = Addresses::find()
        .filter(Column::UserId.eq(user.user_id))
        .filter(Column::DeletedAt.is_null())
        .count(&txn)
        .await?;

    // The first address is always the default.
    let is_default = payload.is_default || existing == 0;
    if is_default {
        clear_default(&txn, user.user_id).await?;
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        label: Set(payload.label.trim().to_string()),
        street: Set(payload.street.trim().to_string()),
        city: Set(payload.city.trim().to_string()),
        state: Set(payload.state.trim().to_string()),
        postal_code: Set(payload.postal_code.trim().to_string()),
        country: Set(payload.country.trim().to_string()),
        instructions: Set(payload.instructions),
        is_default: Set(is_default),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Address created",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<Address>> {
    payload.validate()?;
    let existing = find_owned(&state.orm, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("Address"))?;

    let mut active: AddressActive = existing.into();
    if let Some(label) = payload.label {
        active.label = Set(label.trim().to_string());
    }
    if let Some(street) = payload.street {
        active.street = Set(street.trim().to_string());
    }
    if let Some(city) = payload.city {
        active.city = Set(city.trim().to_string());
    }
    if let Some(region) = payload.state {
        active.state = Set(region.trim().to_string());
    }
    if let Some(postal_code) = payload.postal_code {
        active.postal_code = Set(postal_code.trim().to_string());
    }
    if let Some(country) = payload.country {
        active.country = Set(country.trim().to_string());
    }
    if let Some(instructions) = payload.instructions {
        active.instructions = Set(Some(instructions));
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Address updated",
        address_from_entity(updated),
        Some(Meta::empty()),
    ))
}

/// Soft delete. Past orders keep pointing at the row; a deleted default hands
/// the flag to the most recent remaining address.
pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("Address"))?;
    let was_default = existing.is_default;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(false);
    active.deleted_at = Set(Some(Utc::now().into()));
    active.updated_at = Set(Utc::now().into());
    active.update(&txn).await?;

    if was_default {
        let successor = Addresses::find()
            .filter(Column::UserId.eq(user.user_id))
            .filter(Column::DeletedAt.is_null())
            .order_by_desc(Column::CreatedAt)
            .one(&txn)
            .await?;
        if let Some(successor) = successor {
            let mut active: AddressActive = successor.into();
            active.is_default = Set(true);
            active.update(&txn).await?;
        }
    }

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "address_delete",
        "addresses",
        serde_json::json!({ "address_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Address deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn set_default_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Address>> {
    let txn = state.orm.begin().await?;
    let existing = find_owned(&txn, user.user_id, id)
        .await?
        .ok_or(AppError::NotFound("Address"))?;

    clear_default(&txn, user.user_id).await?;

    let mut active: AddressActive = existing.into();
    active.is_default = Set(true);
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&txn).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "Default address updated",
        address_from_entity(updated),
        Some(Meta::empty()),
    ))
}

pub(crate) fn address_from_entity(model: AddressModel) -> Address {
    Address {
        id: model.id,
        user_id: model.user_id,
        label: model.label,
        street: model.street,
        city: model.city,
        state: model.state,
        postal_code: model.postal_code,
        country: model.country,
        instructions: model.instructions,
        is_default: model.is_default,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}
