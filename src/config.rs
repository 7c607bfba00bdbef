use std::env;
use std::str::FromStr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,
    pub refresh_token_ttl_days: i64,
    /// Subtotal (minor units) from which delivery is free.
    pub free_delivery_threshold: i64,
    /// Flat delivery fee (minor units) charged below the threshold.
    pub delivery_fee: i64,
    pub cors_allowed_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        Ok(Self {
            database_url,
            host,
            port: parse_or("APP_PORT", 3000),
            database_max_connections: parse_or("DATABASE_MAX_CONNECTIONS", 10),
            jwt_secret,
            access_token_ttl_minutes: parse_or("ACCESS_TOKEN_TTL_MINUTES", 15),
            refresh_token_ttl_days: parse_or("REFRESH_TOKEN_TTL_DAYS", 7),
            free_delivery_threshold: parse_or("FREE_DELIVERY_THRESHOLD", 5000),
            delivery_fee: parse_or("DELIVERY_FEE", 499),
            cors_allowed_origin: env::var("CORS_ALLOWED_ORIGIN")
                .ok()
                .filter(|origin| !origin.is_empty()),
        })
    }

    /// Config for tests and tooling that never reads the environment.
    pub fn for_tests(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            host: "127.0.0.1".to_string(),
            port: 0,
            database_max_connections: 5,
            jwt_secret: "test-secret".to_string(),
            access_token_ttl_minutes: 15,
            refresh_token_ttl_days: 7,
            free_delivery_threshold: 5000,
            delivery_fee: 499,
            cors_allowed_origin: None,
        }
    }
}

fn parse_or<T: FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "invalid value, using default");
            default
        }),
        Err(_) => default,
    }
}
