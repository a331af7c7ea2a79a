use serde::Deserialize;
use validator::Validate;

use crate::utils::validator::not_blank;

pub const ERROR_MESSAGE: &str = "Category validation failed";

#[derive(Debug, Deserialize, Validate)]
#[allow(non_snake_case)]
pub struct CreateCategory {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Category name is required"))]
    pub categoryName: String,

    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[allow(non_snake_case)]
pub struct PatchCategory {
    #[validate(custom(function = "not_blank", message = "Category name is required"))]
    pub categoryName: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryQuery {
    pub category_name: Option<String>,
}

/// Filters accepted by `GET /categories/{id}/contacts`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryContactsQuery {
    pub contact_name: Option<String>,
    pub phone: Option<String>,
}
