use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::inventory::{AdjustInventoryRequest, LowStockList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Inventory,
    response::ApiResponse,
    routes::extract::{AppJson, AppPath},
    services::inventory_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/low-stock", get(list_low_stock))
        .route("/{product_id}", get(get_inventory).patch(adjust_inventory))
}

#[utoipa::path(
    get,
    path = "/api/inventory/low-stock",
    responses(
        (status = 200, description = "Active products at or below their threshold", body = ApiResponse<LowStockList>),
        (status = 403, description = "Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn list_low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<LowStockList>>> {
    let resp = inventory_service::list_low_stock(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/inventory/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Stock record", body = ApiResponse<Inventory>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No stock record")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn get_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Inventory>>> {
    let resp = inventory_service::get_inventory(&state, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/inventory/{product_id}",
    params(("product_id" = Uuid, Path, description = "Product ID")),
    request_body = AdjustInventoryRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = ApiResponse<Inventory>),
        (status = 400, description = "Adjustment would go below zero"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "No stock record")
    ),
    security(("bearer_auth" = [])),
    tag = "Inventory"
)]
pub async fn adjust_inventory(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(product_id): AppPath<Uuid>,
    AppJson(payload): AppJson<AdjustInventoryRequest>,
) -> AppResult<Json<ApiResponse<Inventory>>> {
    let resp = inventory_service::adjust_inventory(&state, &user, product_id, payload).await?;
    Ok(Json(resp))
}
