use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::Inventory,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdjustInventoryRequest {
    /// Signed change applied to the current quantity.
    pub delta: Option<i32>,
    pub low_stock_threshold: Option<i32>,
}

impl Validate for AdjustInventoryRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .check(
                self.delta.is_some() || self.low_stock_threshold.is_some(),
                "delta",
                "either delta or low_stock_threshold is required",
            )
            .check(self.delta != Some(0), "delta", "must not be 0")
            .check(
                self.low_stock_threshold.is_none_or(|t| t >= 0),
                "low_stock_threshold",
                "must not be negative",
            )
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LowStockItem {
    #[serde(flatten)]
    pub inventory: Inventory,
    pub product_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct LowStockList {
    #[schema(value_type = Vec<LowStockItem>)]
    pub items: Vec<LowStockItem>,
}
