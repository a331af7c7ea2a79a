use std::sync::Arc;

use cms_auth::Authenticator;
use cms_core::{PagingDefaults, TenantContext};

use super::categories::CategoriesService;
use super::contacts::ContactsService;
use super::tenants::TenantsService;

/// Everything the route handlers share.
pub struct AppState {
    pub contacts: ContactsService,
    pub categories: CategoriesService,
    pub tenants: TenantsService,
    pub authenticator: Arc<Authenticator>,
    pub paging: PagingDefaults,
}

pub type SharedState = Arc<AppState>;

/// Tenant bound to the running request, for log fields.
pub(crate) fn active_tenant() -> String {
    TenantContext::get()
        .map(|t| t.to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// A query filter counts only when it is present and non-empty.
pub(crate) fn filter_text(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
