use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::categories::{CategoryList, CreateCategoryRequest, CreateSubcategoryRequest, SubcategoryList},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Category, Subcategory},
    response::ApiResponse,
    routes::extract::{AppJson, AppPath},
    services::category_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route("/{id_or_slug}", get(get_category))
        .route(
            "/{id_or_slug}/subcategories",
            get(list_subcategories).post(create_subcategory),
        )
}

#[utoipa::path(
    get,
    path = "/api/categories",
    responses(
        (status = 200, description = "Active categories with their subcategories", body = ApiResponse<CategoryList>)
    ),
    tag = "Categories"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    let resp = category_service::list_categories(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id_or_slug}",
    params(("id_or_slug" = String, Path, description = "Category UUID or slug, accents ignored")),
    responses(
        (status = 200, description = "Category", body = ApiResponse<Category>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn get_category(
    State(state): State<AppState>,
    AppPath(id_or_slug): AppPath<String>,
) -> AppResult<Json<ApiResponse<Category>>> {
    let resp = category_service::get_category(&state, &id_or_slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/categories/{id_or_slug}/subcategories",
    params(("id_or_slug" = String, Path, description = "Category UUID or slug, accents ignored")),
    responses(
        (status = 200, description = "Subcategories", body = ApiResponse<SubcategoryList>),
        (status = 404, description = "Category not found")
    ),
    tag = "Categories"
)]
pub async fn list_subcategories(
    State(state): State<AppState>,
    AppPath(id_or_slug): AppPath<String>,
) -> AppResult<Json<ApiResponse<SubcategoryList>>> {
    let resp = category_service::list_subcategories(&state, &id_or_slug).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    request_body = CreateCategoryRequest,
    responses(
        (status = 201, description = "Category created", body = ApiResponse<Category>),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Slug already taken")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateCategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Category>>)> {
    let resp = category_service::create_category(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/categories/{id_or_slug}/subcategories",
    params(("id_or_slug" = Uuid, Path, description = "Category ID")),
    request_body = CreateSubcategoryRequest,
    responses(
        (status = 201, description = "Subcategory created", body = ApiResponse<Subcategory>),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "Slug already taken in this category")
    ),
    security(("bearer_auth" = [])),
    tag = "Categories"
)]
pub async fn create_subcategory(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(category_id): AppPath<Uuid>,
    AppJson(payload): AppJson<CreateSubcategoryRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Subcategory>>)> {
    let resp = category_service::create_subcategory(&state, &user, category_id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
