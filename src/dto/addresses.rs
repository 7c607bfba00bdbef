use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::Address,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAddressRequest {
    pub label: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub instructions: Option<String>,
    #[serde(default)]
    pub is_default: bool,
}

impl Validate for CreateAddressRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.label, "label")
            .required(&self.street, "street")
            .required(&self.city, "city")
            .required(&self.state, "state")
            .required(&self.postal_code, "postal_code")
            .required(&self.country, "country")
            .max_len(Some(&self.label), 50, "label")
            .max_len(Some(&self.street), 200, "street")
            .max_len(Some(&self.postal_code), 20, "postal_code")
            .max_len(self.instructions.as_deref(), 500, "instructions")
            .finish()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAddressRequest {
    pub label: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub instructions: Option<String>,
}

impl Validate for UpdateAddressRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        for (value, field) in [
            (&self.label, "label"),
            (&self.street, "street"),
            (&self.city, "city"),
            (&self.state, "state"),
            (&self.postal_code, "postal_code"),
            (&self.country, "country"),
        ] {
            if let Some(value) = value {
                v.required(value, field);
            }
        }
        v.max_len(self.label.as_deref(), 50, "label")
            .max_len(self.street.as_deref(), 200, "street")
            .max_len(self.postal_code.as_deref(), 20, "postal_code")
            .max_len(self.instructions.as_deref(), 500, "instructions")
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct AddressList {
    #[schema(value_type = Vec<Address>)]
    pub items: Vec<Address>,
}
