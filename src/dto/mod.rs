use crate::error::{AppError, AppResult, FieldError};

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod inventory;
pub mod orders;
pub mod products;
pub mod reviews;
pub mod users;

/// Request bodies check their own shape before any service touches the database.
pub trait Validate {
    fn validate(&self) -> AppResult<()>;
}

/// Collects every failing field so the client sees all problems at once.
#[derive(Debug, Default)]
pub struct Violations(Vec<FieldError>);

impl Violations {
    pub fn check(&mut self, ok: bool, field: &str, message: &str) -> &mut Self {
        if !ok {
            self.0.push(FieldError::new(field, message));
        }
        self
    }

    pub fn required(&mut self, value: &str, field: &str) -> &mut Self {
        self.check(!value.trim().is_empty(), field, "must not be empty")
    }

    pub fn max_len(&mut self, value: Option<&str>, max: usize, field: &str) -> &mut Self {
        let ok = value.is_none_or(|v| v.chars().count() <= max);
        self.check(ok, field, &format!("must be at most {max} characters"))
    }

    pub fn finish(&mut self) -> AppResult<()> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.0)))
        }
    }
}

pub(crate) fn looks_like_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}
