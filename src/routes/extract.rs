use axum::extract::{
    FromRequest, FromRequestParts,
    rejection::{JsonRejection, PathRejection, QueryRejection},
};

use crate::error::{AppError, FieldError};

/// `Json` whose rejections render as the API envelope.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct AppQuery<T>(pub T);

#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct AppPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(err) => {
                AppError::Validation(vec![field_error(&err.body_text(), "body")])
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(vec![field_error(&rejection.body_text(), "query")])
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        match rejection {
            PathRejection::FailedToDeserializePathParams(err) => {
                AppError::Validation(vec![FieldError::new("path", err.body_text())])
            }
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

/// Splits axum's `"<summary>: <field>: <message>"` rejection text into a field error.
fn field_error(text: &str, fallback: &str) -> FieldError {
    let detail = text.split_once(": ").map_or(text, |(_, rest)| rest);
    match detail.split_once(": ") {
        Some((field, message)) if !field.is_empty() && !field.contains(' ') => {
            FieldError::new(field, message)
        }
        _ => FieldError::new(fallback, detail),
    }
}

