use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Validate,
        categories::{CategoryList, CreateCategoryRequest, CreateSubcategoryRequest, SubcategoryList},
    },
    entity::{
        categories::{ActiveModel as CategoryActive, Column as CatCol, Entity as Categories, Model as CategoryModel},
        subcategories::{
            ActiveModel as SubcategoryActive, Column as SubCol, Entity as Subcategories,
            Model as SubcategoryModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Category, Subcategory},
    response::{ApiResponse, Meta},
    slug,
    state::AppState,
};

/// Find an active category by UUID or by accent-insensitive slug.
pub async fn resolve_category<C: ConnectionTrait>(
    conn: &C,
    id_or_slug: &str,
) -> AppResult<Option<CategoryModel>> {
    let mut finder = Categories::find().filter(CatCol::IsActive.eq(true));
    finder = match Uuid::parse_str(id_or_slug) {
        Ok(id) => finder.filter(CatCol::Id.eq(id)),
        Err(_) => finder.filter(CatCol::Slug.eq(slug::normalize(id_or_slug))),
    };
    Ok(finder.one(conn).await?)
}

/// Find an active subcategory of `category_id` by UUID or slug.
pub async fn resolve_subcategory<C: ConnectionTrait>(
    conn: &C,
    category_id: Option<Uuid>,
    id_or_slug: &str,
) -> AppResult<Option<SubcategoryModel>> {
    let mut finder = Subcategories::find().filter(SubCol::IsActive.eq(true));
    if let Some(category_id) = category_id {
        finder = finder.filter(SubCol::CategoryId.eq(category_id));
    }
    finder = match Uuid::parse_str(id_or_slug) {
        Ok(id) => finder.filter(SubCol::Id.eq(id)),
        Err(_) => finder.filter(SubCol::Slug.eq(slug::normalize(id_or_slug))),
    };
    Ok(finder.one(conn).await?)
}

async fn active_subcategories<C: ConnectionTrait>(
    conn: &C,
    category_ids: Vec<Uuid>,
) -> AppResult<Vec<SubcategoryModel>> {
    Ok(Subcategories::find()
        .filter(SubCol::CategoryId.is_in(category_ids))
        .filter(SubCol::IsActive.eq(true))
        .order_by_asc(SubCol::SortOrder)
        .order_by_asc(SubCol::Name)
        .all(conn)
        .await?)
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let categories = Categories::find()
        .filter(CatCol::IsActive.eq(true))
        .order_by_asc(CatCol::SortOrder)
        .order_by_asc(CatCol::Name)
        .all(&state.orm)
        .await?;

    let ids = categories.iter().map(|c| c.id).collect();
    let mut grouped: HashMap<Uuid, Vec<Subcategory>> = HashMap::new();
    for sub in active_subcategories(&state.orm, ids).await? {
        grouped
            .entry(sub.category_id)
            .or_default()
            .push(subcategory_from_entity(sub));
    }

    let items: Vec<Category> = categories
        .into_iter()
        .map(|c| {
            let subs = grouped.remove(&c.id).unwrap_or_default();
            category_from_entity(c, subs)
        })
        .collect();

    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn get_category(
    state: &AppState,
    id_or_slug: &str,
) -> AppResult<ApiResponse<Category>> {
    let category = resolve_category(&state.orm, id_or_slug)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    let subs = active_subcategories(&state.orm, vec![category.id])
        .await?
        .into_iter()
        .map(subcategory_from_entity)
        .collect();
    Ok(ApiResponse::success(
        "Category",
        category_from_entity(category, subs),
        None,
    ))
}

pub async fn list_subcategories(
    state: &AppState,
    id_or_slug: &str,
) -> AppResult<ApiResponse<SubcategoryList>> {
    let category = resolve_category(&state.orm, id_or_slug)
        .await?
        .ok_or(AppError::NotFound("Category"))?;
    let items: Vec<Subcategory> = active_subcategories(&state.orm, vec![category.id])
        .await?
        .into_iter()
        .map(subcategory_from_entity)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Subcategories",
        SubcategoryList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn create_category(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCategoryRequest,
) -> AppResult<ApiResponse<Category>> {
    ensure_admin(user)?;
    payload.validate()?;
    let slug = slug::normalize(&payload.name);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Category name has no usable characters".into()));
    }

    let taken = Categories::find()
        .filter(CatCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(format!("Category '{slug}' already exists")));
    }

    let category = CategoryActive {
        id: Set(Uuid::new_v4()),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        description: Set(payload.description),
        image_url: Set(payload.image_url),
        sort_order: Set(payload.sort_order),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "category_create",
        "categories",
        serde_json::json!({ "category_id": category.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Category created",
        category_from_entity(category, Vec::new()),
        Some(Meta::empty()),
    ))
}

pub async fn create_subcategory(
    state: &AppState,
    user: &AuthUser,
    category_id: Uuid,
    payload: CreateSubcategoryRequest,
) -> AppResult<ApiResponse<Subcategory>> {
    ensure_admin(user)?;
    payload.validate()?;
    let category = Categories::find_by_id(category_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    let slug = slug::normalize(&payload.name);
    if slug.is_empty() {
        return Err(AppError::BadRequest("Subcategory name has no usable characters".into()));
    }
    let taken = Subcategories::find()
        .filter(SubCol::CategoryId.eq(category.id))
        .filter(SubCol::Slug.eq(slug.as_str()))
        .one(&state.orm)
        .await?;
    if taken.is_some() {
        return Err(AppError::Conflict(format!("Subcategory '{slug}' already exists")));
    }

    let sub = SubcategoryActive {
        id: Set(Uuid::new_v4()),
        category_id: Set(category.id),
        name: Set(payload.name.trim().to_string()),
        slug: Set(slug),
        sort_order: Set(payload.sort_order),
        is_active: Set(true),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(ApiResponse::success(
        "Subcategory created",
        subcategory_from_entity(sub),
        Some(Meta::empty()),
    ))
}

fn category_from_entity(model: CategoryModel, subcategories: Vec<Subcategory>) -> Category {
    Category {
        id: model.id,
        name: model.name,
        slug: model.slug,
        description: model.description,
        image_url: model.image_url,
        sort_order: model.sort_order,
        subcategories,
    }
}

fn subcategory_from_entity(model: SubcategoryModel) -> Subcategory {
    Subcategory {
        id: model.id,
        category_id: model.category_id,
        name: model.name,
        slug: model.slug,
        sort_order: model.sort_order,
    }
}

