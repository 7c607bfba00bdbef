use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    dto::{Validate, Violations, cart::MAX_LINE_QUANTITY},
    error::AppResult,
    models::{Address, Order, OrderItem, OrderStatus, PaymentMethod, ProductSummary},
};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CheckoutItem {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    pub delivery_address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
}

impl Validate for CheckoutRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        v.check(!self.items.is_empty(), "items", "must contain at least one item");
        for (i, item) in self.items.iter().enumerate() {
            v.check(
                (1..=MAX_LINE_QUANTITY).contains(&item.quantity),
                &format!("items[{i}].quantity"),
                "must be between 1 and 99",
            );
        }
        v.max_len(self.notes.as_deref(), 500, "notes").finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: OrderStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderItemDetail {
    #[serde(flatten)]
    pub item: OrderItem,
    pub product: ProductSummary,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItemDetail>,
    pub delivery_address: Address,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct OrderList {
    #[schema(value_type = Vec<Order>)]
    pub items: Vec<Order>,
}
