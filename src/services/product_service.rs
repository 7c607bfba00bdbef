use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Validate,
        products::{CategoryRef, CreateProductRequest, ProductDetail, ProductList, UpdateProductRequest},
    },
    entity::{
        categories::Entity as Categories,
        inventory::{ActiveModel as InventoryActive, Column as InvCol, Entity as Inventory},
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        subcategories::Entity as Subcategories,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{FeaturedQuery, ProductQuery, ProductSortBy, SearchQuery, SortOrder},
    services::{category_service, review_service},
    slug,
    state::AppState,
};

pub const DEFAULT_LOW_STOCK_THRESHOLD: i32 = 10;

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(Column::IsActive.eq(true));

    if let Some(search) = query.q.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        condition = condition.add(search_condition(search));
    }

    let mut category_id = None;
    if let Some(category) = query.category.as_deref().filter(|s| !s.is_empty()) {
        let found = category_service::resolve_category(&state.orm, category)
            .await?
            .ok_or(AppError::NotFound("Category"))?;
        category_id = Some(found.id);
        condition = condition.add(Column::CategoryId.eq(found.id));
    }

    if let Some(subcategory) = query.subcategory.as_deref().filter(|s| !s.is_empty()) {
        let found = category_service::resolve_subcategory(&state.orm, category_id, subcategory)
            .await?
            .ok_or(AppError::NotFound("Subcategory"))?;
        condition = condition.add(Column::SubcategoryId.eq(found.id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    if let Some(featured) = query.featured {
        condition = condition.add(Column::IsFeatured.eq(featured));
    }

    if query.in_stock == Some(true) {
        condition = condition.add(
            Column::Id.in_subquery(
                Query::select()
                    .column(InvCol::ProductId)
                    .from(Inventory)
                    .and_where(Expr::col(InvCol::Quantity).gt(0))
                    .to_owned(),
            ),
        );
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::Name);
    let sort_order = query.sort_order.unwrap_or(match sort_by {
        ProductSortBy::CreatedAt => SortOrder::Desc,
        _ => SortOrder::Asc,
    });
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };
    finder = finder.order_by_asc(Column::Id);

    let total = finder.clone().count(&state.orm).await? as i64;

    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;
    let items = with_stock(&state.orm, models).await?;

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn search_products(
    state: &AppState,
    query: SearchQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let q = query.q.trim();
    if q.is_empty() {
        return Err(AppError::Validation(vec![crate::error::FieldError::new(
            "q",
            "must not be empty",
        )]));
    }
    list_products(state, ProductQuery::search(q, query.pagination())).await
}

pub async fn featured_products(
    state: &AppState,
    query: FeaturedQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let limit = query.limit.unwrap_or(8).clamp(1, 50);
    let models = Products::find()
        .filter(Column::IsActive.eq(true))
        .filter(Column::IsFeatured.eq(true))
        .order_by_desc(Column::CreatedAt)
        .limit(limit)
        .all(&state.orm)
        .await?;
    let items = with_stock(&state.orm, models).await?;
    Ok(ApiResponse::success("Featured products", ProductList { items }, None))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let model = Products::find_by_id(id)
        .filter(Column::IsActive.eq(true))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let category = Categories::find_by_id(model.category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    let (average_rating, review_count) = review_service::rating_summary(&state.pool, id).await?;
    let stock = stock_for(&state.orm, &[model.id]).await?;
    let product = product_from_entity(model, &stock)?;

    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product,
            category: CategoryRef {
                id: category.id,
                name: category.name,
                slug: category.slug,
            },
            average_rating,
            review_count,
        },
        None,
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    ensure_category(&state.orm, payload.category_id, payload.subcategory_id).await?;

    let txn = state.orm.begin().await?;
    let product = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug::normalize(&payload.name)),
        description: Set(payload.description),
        price: Set(payload.price),
        unit: Set(payload.unit.as_str().to_string()),
        image_url: Set(payload.image_url),
        category_id: Set(payload.category_id),
        subcategory_id: Set(payload.subcategory_id),
        is_active: Set(true),
        is_featured: Set(payload.is_featured),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    InventoryActive {
        product_id: Set(product.id),
        quantity: Set(payload.initial_stock),
        low_stock_threshold: Set(payload
            .low_stock_threshold
            .unwrap_or(DEFAULT_LOW_STOCK_THRESHOLD)),
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    txn.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let stock = HashMap::from([(product.id, payload.initial_stock)]);
    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product, &stock)?,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    payload.validate()?;
    let existing = Products::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Product"))?;

    let category_id = payload.category_id.unwrap_or(existing.category_id);
    // Moving to another category drops a subcategory that was not replaced.
    let keep_subcategory = !payload.clear_subcategory && category_id == existing.category_id;
    let subcategory_id = payload
        .subcategory_id
        .or(existing.subcategory_id.filter(|_| keep_subcategory));
    if payload.category_id.is_some() || payload.subcategory_id.is_some() {
        ensure_category(&state.orm, category_id, subcategory_id).await?;
    }

    let mut active: ActiveModel = existing.into();
    if let Some(name) = payload.name {
        active.slug = Set(slug::normalize(&name));
        active.name = Set(name.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(Some(description));
    }
    if let Some(price) = payload.price {
        active.price = Set(price);
    }
    if let Some(unit) = payload.unit {
        active.unit = Set(unit.as_str().to_string());
    }
    if let Some(image_url) = payload.image_url {
        active.image_url = Set(Some(image_url));
    }
    if let Some(is_active) = payload.is_active {
        active.is_active = Set(is_active);
    }
    if let Some(is_featured) = payload.is_featured {
        active.is_featured = Set(is_featured);
    }
    active.category_id = Set(category_id);
    active.subcategory_id = Set(subcategory_id);
    active.updated_at = Set(Utc::now().into());

    let product = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    let stock = stock_for(&state.orm, &[product.id]).await?;
    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product, &stock)?,
        Some(Meta::empty()),
    ))
}

/// Products referenced by orders are never removed; deleting hides them from the catalogue.
pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = Products::update_many()
        .col_expr(Column::IsActive, Expr::value(false))
        .col_expr(Column::UpdatedAt, Expr::current_timestamp().into())
        .filter(Column::Id.eq(id))
        .filter(Column::IsActive.eq(true))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("Product"));
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn search_condition(search: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(search));
    let mut any = Condition::any()
        .add(Expr::col(Column::Name).ilike(pattern.clone()))
        .add(Expr::col(Column::Description).ilike(pattern));
    // Slugs drop punctuation, so only plain words are matched against them.
    let plain = search
        .chars()
        .all(|c| c.is_alphanumeric() || c.is_whitespace() || c == '-');
    let folded = slug::normalize(search);
    if plain && !folded.is_empty() {
        any = any.add(Column::Slug.contains(folded));
    }
    any
}

/// Escapes `LIKE` wildcards so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

async fn ensure_category<C: ConnectionTrait>(
    conn: &C,
    category_id: Uuid,
    subcategory_id: Option<Uuid>,
) -> AppResult<()> {
    if Categories::find_by_id(category_id).one(conn).await?.is_none() {
        return Err(AppError::BadRequest("Unknown category".into()));
    }
    if let Some(subcategory_id) = subcategory_id {
        let sub = Subcategories::find_by_id(subcategory_id).one(conn).await?;
        if sub.is_none_or(|s| s.category_id != category_id) {
            return Err(AppError::BadRequest(
                "Subcategory does not belong to category".into(),
            ));
        }
    }
    Ok(())
}

pub(crate) async fn stock_for<C: ConnectionTrait>(
    conn: &C,
    ids: &[Uuid],
) -> AppResult<HashMap<Uuid, i32>> {
    Ok(Inventory::find()
        .filter(InvCol::ProductId.is_in(ids.to_vec()))
        .all(conn)
        .await?
        .into_iter()
        .map(|inv| (inv.product_id, inv.quantity))
        .collect())
}

async fn with_stock<C: ConnectionTrait>(
    conn: &C,
    models: Vec<ProductModel>,
) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let stock = stock_for(conn, &ids).await?;
    models
        .into_iter()
        .map(|m| product_from_entity(m, &stock))
        .collect()
}

pub(crate) fn product_from_entity(
    model: ProductModel,
    stock: &HashMap<Uuid, i32>,
) -> AppResult<Product> {
    Ok(Product {
        id: model.id,
        stock: stock.get(&model.id).copied().unwrap_or(0),
        name: model.name,
        slug: model.slug,
        description: model.description,
        price: model.price,
        unit: model.unit.parse()?,
        image_url: model.image_url,
        category_id: model.category_id,
        subcategory_id: model.subcategory_id,
        is_active: model.is_active,
        is_featured: model.is_featured,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}
