use cms_core::Role;
use cms_store::Record;
use serde::{Deserialize, Serialize};

pub const TENANTS_COLLECTION: &str = "tenants";
pub const USERNAME_FIELD: &str = "username";
pub const NAME_FIELD: &str = "name";

/// Tenant record as stored in the default database. `password` holds the
/// bcrypt hash and never leaves the server; clients get a [`TenantView`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Record for Tenant {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantView {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub username: String,
    pub role: Role,
}

impl From<Tenant> for TenantView {
    fn from(tenant: Tenant) -> Self {
        Self {
            id: tenant.id,
            name: tenant.name,
            description: tenant.description,
            username: tenant.username,
            role: tenant.role,
        }
    }
}
