use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::{Product, ProductUnit},
};

/// Upper bound for a unit price, in cents.
pub const MAX_PRICE: i64 = 100_000_000;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateProductRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub unit: ProductUnit,
    pub image_url: Option<String>,
    pub category_id: Uuid,
    pub subcategory_id: Option<Uuid>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub initial_stock: i32,
    pub low_stock_threshold: Option<i32>,
}

impl Validate for CreateProductRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.name, "name")
            .max_len(Some(&self.name), 200, "name")
            .max_len(self.description.as_deref(), 2000, "description")
            .check(self.price >= 0, "price", "must not be negative")
            .check(self.price <= MAX_PRICE, "price", "is too large")
            .check(self.initial_stock >= 0, "initial_stock", "must not be negative")
            .check(
                self.low_stock_threshold.is_none_or(|t| t >= 0),
                "low_stock_threshold",
                "must not be negative",
            )
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub unit: Option<ProductUnit>,
    pub image_url: Option<String>,
    pub category_id: Option<Uuid>,
    pub subcategory_id: Option<Uuid>,
    /// Detach the product from its subcategory.
    #[serde(default)]
    pub clear_subcategory: bool,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
}

impl Validate for UpdateProductRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        if let Some(name) = &self.name {
            v.required(name, "name");
        }
        v.max_len(self.name.as_deref(), 200, "name")
            .max_len(self.description.as_deref(), 2000, "description")
            .check(self.price.is_none_or(|p| p >= 0), "price", "must not be negative")
            .check(self.price.is_none_or(|p| p <= MAX_PRICE), "price", "is too large")
            .check(
                !(self.clear_subcategory && self.subcategory_id.is_some()),
                "subcategory_id",
                "cannot be combined with clear_subcategory",
            )
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ProductList {
    #[schema(value_type = Vec<Product>)]
    pub items: Vec<Product>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryRef {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: CategoryRef,
    pub average_rating: Option<f64>,
    pub review_count: i64,
}
