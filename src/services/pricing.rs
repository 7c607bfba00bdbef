use crate::{
    config::AppConfig,
    error::{AppError, AppResult},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Totals {
    pub subtotal: i64,
    pub delivery_fee: i64,
    pub total: i64,
}

/// Delivery is free from `free_threshold` upwards, a flat fee below it.
#[derive(Debug, Clone, Copy)]
pub struct DeliveryPolicy {
    pub free_threshold: i64,
    pub flat_fee: i64,
}

impl DeliveryPolicy {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            free_threshold: config.free_delivery_threshold,
            flat_fee: config.delivery_fee,
        }
    }

    pub fn fee_for(&self, subtotal: i64) -> i64 {
        if subtotal >= self.free_threshold {
            0
        } else {
            self.flat_fee
        }
    }

    /// Totals for `(unit_price, quantity)` lines. An empty basket costs nothing.
    pub fn totals<I>(&self, lines: I) -> AppResult<Totals>
    where
        I: IntoIterator<Item = (i64, i32)>,
    {
        let mut any = false;
        let mut subtotal: i64 = 0;
        for (price, quantity) in lines {
            any = true;
            subtotal = subtotal
                .checked_add(line_total(price, quantity)?)
                .ok_or_else(amount_too_large)?;
        }
        let delivery_fee = if any { self.fee_for(subtotal) } else { 0 };
        let total = subtotal
            .checked_add(delivery_fee)
            .ok_or_else(amount_too_large)?;
        Ok(Totals {
            subtotal,
            delivery_fee,
            total,
        })
    }
}

pub fn line_total(unit_price: i64, quantity: i32) -> AppResult<i64> {
    unit_price
        .checked_mul(i64::from(quantity))
        .ok_or_else(amount_too_large)
}

fn amount_too_large() -> AppError {
    AppError::BadRequest("Order amount is too large".into())
}
