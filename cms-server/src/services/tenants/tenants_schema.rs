use serde::Deserialize;
use validator::Validate;

use crate::utils::validator::not_blank;

pub const ERROR_MESSAGE: &str = "Tenant validation failed";

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTenant {
    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Tenant name is required"))]
    pub name: String,

    pub description: Option<String>,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Username is required"))]
    pub username: String,

    #[serde(default)]
    #[validate(custom(function = "not_blank", message = "Password is required"))]
    pub password: String,

    /// `ADMIN` or anything else; defaults to `USER`.
    pub role: Option<String>,
}

/// Only the display fields of a tenant can change.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct PatchTenant {
    #[validate(custom(function = "not_blank", message = "Tenant name is required"))]
    pub name: Option<String>,

    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TenantQuery {
    pub name: Option<String>,
}
