use uuid::Uuid;

use crate::{
    db::DbPool,
    dto::{
        Validate,
        reviews::{ReviewList, UpsertReviewRequest},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Review,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

async fn ensure_active_product(pool: &DbPool, product_id: Uuid) -> AppResult<()> {
    let found: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM products WHERE id = $1 AND is_active")
            .bind(product_id)
            .fetch_optional(pool)
            .await?;
    found.map(|_| ()).ok_or(AppError::NotFound("Product"))
}

/// Average rating and number of reviews for a product.
pub async fn rating_summary(pool: &DbPool, product_id: Uuid) -> AppResult<(Option<f64>, i64)> {
    let row: (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(rating)::float8, COUNT(*) FROM reviews WHERE product_id = $1",
    )
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

pub async fn list_reviews(
    state: &AppState,
    product_id: Uuid,
    pagination: Pagination,
) -> AppResult<ApiResponse<ReviewList>> {
    ensure_active_product(&state.pool, product_id).await?;
    let (page, limit, offset) = pagination.normalize();

    let items = sqlx::query_as::<_, Review>(
        r#"
        SELECT * FROM reviews
        WHERE product_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(product_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(&state.pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM reviews WHERE product_id = $1")
        .bind(product_id)
        .fetch_one(&state.pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Reviews", ReviewList { items }, Some(meta)))
}

/// One review per user and product; posting again replaces the previous one.
pub async fn upsert_review(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpsertReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    payload.validate()?;
    ensure_active_product(&state.pool, product_id).await?;

    let review = sqlx::query_as::<_, Review>(
        r#"
        INSERT INTO reviews (id, user_id, product_id, rating, comment)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET rating = EXCLUDED.rating, comment = EXCLUDED.comment, updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.rating)
    .bind(payload.comment)
    .fetch_one(&state.pool)
    .await?;

    Ok(ApiResponse::success("Review saved", review, Some(Meta::empty())))
}
