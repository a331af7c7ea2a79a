use anyhow::Result;
use async_trait::async_trait;
use cms_auth::{AccountStore, StoredAccount};
use cms_core::TenantId;

use super::tenants_service::TenantsService;
use super::tenants_shared::Tenant;

/// Tenant records double as login accounts.
pub struct TenantAccounts {
    tenants: TenantsService,
}

impl TenantAccounts {
    pub fn new(tenants: TenantsService) -> Self {
        Self { tenants }
    }
}

fn account(tenant: Tenant) -> StoredAccount {
    StoredAccount {
        id: TenantId::new(tenant.id),
        username: tenant.username,
        password_hash: tenant.password,
        role: tenant.role,
    }
}

#[async_trait]
impl AccountStore for TenantAccounts {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredAccount>> {
        Ok(self.tenants.find_by_username(username).await?.map(account))
    }

    async fn find_by_id(&self, id: &TenantId) -> Result<Option<StoredAccount>> {
        Ok(self.tenants.find(id.as_str()).await?.map(account))
    }
}
