use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::ProductSummary,
};

pub const MAX_LINE_QUANTITY: i32 = 99;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

impl Validate for AddToCartRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .check(
                (1..=MAX_LINE_QUANTITY).contains(&self.quantity),
                "quantity",
                "must be between 1 and 99",
            )
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

impl Validate for UpdateCartItemRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .check(
                (1..=MAX_LINE_QUANTITY).contains(&self.quantity),
                "quantity",
                "must be between 1 and 99",
            )
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDto {
    pub id: Uuid,
    pub product: ProductSummary,
    pub unit_price: i64,
    pub quantity: i32,
    pub line_total: i64,
    pub available_stock: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub items: Vec<CartItemDto>,
    pub item_count: i64,
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
}
