use serde::Deserialize;
use validator::Validate;

use crate::utils::validator::not_blank;

pub const ERROR_MESSAGE: &str = "Contact validation failed";

#[derive(Debug, Deserialize, Validate)]
#[allow(non_snake_case)]
pub struct CreateContact {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Contact name is required"))]
    pub contactName: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Phone number is required"))]
    pub phone: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[serde(default)]
    pub categoryIds: Vec<String>,
}

/// Partial update: only the fields present are changed.
#[derive(Debug, Default, Deserialize, Validate)]
#[allow(non_snake_case)]
pub struct PatchContact {
    #[validate(custom(function = "not_blank", message = "Contact name is required"))]
    pub contactName: Option<String>,

    #[validate(custom(function = "not_blank", message = "Phone number is required"))]
    pub phone: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    pub categoryIds: Option<Vec<String>>,
}

/// Filters accepted by `GET /contacts`. The first non-empty one wins.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactQuery {
    pub contact_name: Option<String>,
    pub phone: Option<String>,
    pub category_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactCategoryQuery {
    pub category_name: Option<String>,
}
