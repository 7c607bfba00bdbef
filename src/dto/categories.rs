use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::{Validate, Violations},
    error::AppResult,
    models::{Category, Subcategory},
};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCategoryRequest {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
}

impl Validate for CreateCategoryRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.name, "name")
            .max_len(Some(&self.name), 100, "name")
            .max_len(self.description.as_deref(), 1000, "description")
            .finish()
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateSubcategoryRequest {
    pub name: String,
    #[serde(default)]
    pub sort_order: i32,
}

impl Validate for CreateSubcategoryRequest {
    fn validate(&self) -> AppResult<()> {
        Violations::default()
            .required(&self.name, "name")
            .max_len(Some(&self.name), 100, "name")
            .finish()
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CategoryList {
    #[schema(value_type = Vec<Category>)]
    pub items: Vec<Category>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct SubcategoryList {
    #[schema(value_type = Vec<Subcategory>)]
    pub items: Vec<Subcategory>,
}
