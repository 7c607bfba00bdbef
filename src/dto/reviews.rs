use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::Review,
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

impl Validate for UpsertReviewRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .check((1..=5).contains(&self.rating), "rating", "must be between 1 and 5")
            .max_len(self.comment.as_deref(), 1000, "comment")
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct ReviewList {
    #[schema(value_type = Vec<Review>)]
    pub items: Vec<Review>,
}
