use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations, looks_like_email},
    error::AppResult,
    models::User,
};

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Deserialize, Debug, ToSchema)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

impl Validate for RegisterRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .check(looks_like_email(&self.email), "email", "must be a valid email address")
            .check(
                self.password.chars().count() >= MIN_PASSWORD_LEN,
                "password",
                "must be at least 8 characters",
            )
            .required(&self.first_name, "first_name")
            .required(&self.last_name, "last_name")
            .max_len(Some(&self.first_name), 100, "first_name")
            .max_len(Some(&self.last_name), 100, "last_name")
            .max_len(self.phone.as_deref(), 30, "phone")
            .finish()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl Validate for LoginRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.email, "email")
            .required(&self.password, "password")
            .finish()
    }
}

#[derive(Deserialize, Debug, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: User,
    pub tokens: TokenPair,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Access,
    Refresh,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Claims {
    pub sub: String,
    pub role: String,
    pub typ: TokenKind,
    pub jti: String,
    pub iat: usize,
    pub exp: usize,
}
