use serde::Deserialize;
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations, auth::MIN_PASSWORD_LEN},
    error::AppResult,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
}

impl Validate for UpdateProfileRequest {
    fn validate(&self) -> AppResult<()> {
        let mut v = Violations::default();
        if let Some(first_name) = &self.first_name {
            v.required(first_name, "first_name");
        }
        if let Some(last_name) = &self.last_name {
            v.required(last_name, "last_name");
        }
        v.max_len(self.first_name.as_deref(), 100, "first_name")
            .max_len(self.last_name.as_deref(), 100, "last_name")
            .max_len(self.phone.as_deref(), 30, "phone")
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

impl Validate for ChangePasswordRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.current_password, "current_password")
            .check(
                self.new_password.chars().count() >= MIN_PASSWORD_LEN,
                "new_password",
                "must be at least 8 characters",
            )
            .finish()
    }
}
