use std::sync::Arc;

use anyhow::Result;
use cms_auth::{hash_password, AuthError};
use cms_core::{
    bail_cms, CmsError, DuplicateKey, Filter, Page, PageRequest, Role, TenantGuard, TenantId,
    TenantLifecycle, UniqueIndex,
};
use cms_store::{new_id, Repository};
use tracing::{debug, error, info, warn};

use crate::utils::validator::trimmed;

use super::tenants_schema::{CreateTenant, PatchTenant};
use super::tenants_shared::{Tenant, TenantView, NAME_FIELD, USERNAME_FIELD};

/// Tenant administration. Creating a tenant provisions its database and
/// deleting one drops it; both run under the tenant's lifecycle lock.
#[derive(Clone)]
pub struct TenantsService {
    tenants: Repository<Tenant>,
    lifecycle: Arc<TenantLifecycle>,
    hash_cost: u32,
}

impl TenantsService {
    pub fn new(tenants: Repository<Tenant>, lifecycle: Arc<TenantLifecycle>, hash_cost: u32) -> Self {
        Self {
            tenants,
            lifecycle,
            hash_cost,
        }
    }

    pub fn lifecycle(&self) -> &TenantLifecycle {
        &self.lifecycle
    }

    pub async fn list(&self, name: Option<&str>, page: &PageRequest) -> Result<Page<TenantView>> {
        let filter = match name.filter(|n| !n.is_empty()) {
            Some(name) => Filter::new().contains_ignore_case(NAME_FIELD, name),
            None => Filter::new(),
        };
        let found = self.tenants.find_page(filter, page).await?;
        debug!(total = found.total_elements, "tenants found");
        Ok(found.map(TenantView::from))
    }

    pub async fn find(&self, id: &str) -> Result<Option<Tenant>> {
        self.tenants.find_by_id(id).await
    }

    pub async fn get(&self, id: &str) -> Result<Tenant> {
        match self.find(id).await? {
            Some(tenant) => Ok(tenant),
            None => {
                warn!(id, "tenant not found");
                bail_cms!(not_found, "Tenant not found with id: {}", id)
            }
        }
    }

    /// Usernames are unique across tenants.
    pub async fn ensure_indexes(&self) -> Result<()> {
        self.tenants.ensure_unique(&UniqueIndex::new(USERNAME_FIELD)).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<Tenant>> {
        self.tenants
            .find_one(Filter::new().eq(USERNAME_FIELD, username))
            .await
    }

    pub async fn create(&self, input: CreateTenant) -> Result<TenantView> {
        let username = input.username.trim().to_string();
        debug!(name = %input.name, %username, "creating tenant");

        if self.find_by_username(&username).await?.is_some() {
            warn!(%username, "tenant already exists with username");
            bail_cms!(conflict, "Username already exists: {}", username);
        }

        let password = hash_password(&input.password, self.hash_cost).map_err(AuthError::into_anyhow)?;
        let role = Role::from(input.role.as_deref().unwrap_or("USER"));
        let id = TenantId::new(new_id());
        let tenant = Tenant {
            id: id.to_string(),
            name: input.name.trim().to_string(),
            description: trimmed(input.description),
            username,
            password,
            role,
        };

        let guard = self.lifecycle.lock(&id).await;
        let provisioned = match self.lifecycle.provision(&guard, &tenant.role).await {
            Ok(provisioned) => provisioned,
            Err(err) => {
                error!(tenant = %id, error = %err, "provisioning tenant database failed");
                self.discard_database(&guard).await;
                return Err(CmsError::from(err).into_anyhow());
            }
        };

        // The unique index settles concurrent creations with one username.
        if let Err(err) = self.tenants.insert(&tenant).await {
            if provisioned.is_some() {
                self.discard_database(&guard).await;
            }
            if DuplicateKey::find(&err).is_some() {
                warn!(username = %tenant.username, "tenant already exists with username");
                bail_cms!(conflict, "Username already exists: {}", tenant.username);
            }
            error!(tenant = %id, error = %err, "storing tenant record failed");
            return Err(err);
        }

        info!(tenant = %id, role = %tenant.role, "created tenant");
        Ok(tenant.into())
    }

    pub async fn update(&self, id: &str, patch: PatchTenant) -> Result<TenantView> {
        self.get(id).await?;
        let _guard = self.lifecycle.lock(&TenantId::new(id)).await;
        let mut tenant = self.get(id).await?;

        if let Some(name) = patch.name.map(|n| n.trim().to_string()) {
            if name != tenant.name {
                if self.name_taken(&name, id).await? {
                    warn!(%name, "tenant name already exists");
                    bail_cms!(conflict, "Tenant with name: {} already exists", name);
                }
                tenant.name = name;
            }
        }
        if patch.description.is_some() {
            tenant.description = trimmed(patch.description);
        }

        if !self.tenants.save(&tenant).await? {
            bail_cms!(not_found, "Tenant not found with id: {}", id);
        }
        info!(tenant = %id, "updated tenant");
        Ok(tenant.into())
    }

    /// Drop the tenant's database, then its record. If the database cannot
    /// be dropped the record is kept and the caller gets `Unavailable`.
    pub async fn delete(&self, id: &str) -> Result<TenantView> {
        self.get(id).await?;
        let guard = self.lifecycle.lock(&TenantId::new(id)).await;
        // Re-read under the lock in case a concurrent delete won.
        let tenant = self.get(id).await?;

        if let Err(err) = self.lifecycle.deprovision(&guard).await {
            error!(tenant = %id, error = %err, "tenant deletion aborted, record kept");
            return Err(CmsError::from(err).into_anyhow());
        }

        self.tenants.delete_by_id(id).await?;
        info!(tenant = %id, "deleted tenant");
        Ok(tenant.into())
    }

    /// Create the administrator account unless one with that username exists.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<()> {
        if self.find_by_username(username).await?.is_some() {
            debug!(username, "admin account present");
            return Ok(());
        }

        let admin = Tenant {
            id: new_id(),
            name: "System Administrator".to_string(),
            description: Some("System administrator account".to_string()),
            username: username.to_string(),
            password: hash_password(password, self.hash_cost).map_err(AuthError::into_anyhow)?,
            role: Role::Admin,
        };
        self.tenants.insert(&admin).await?;
        info!(username, "created admin account");
        Ok(())
    }

    async fn discard_database(&self, guard: &TenantGuard) {
        if let Err(err) = self.lifecycle.deprovision(guard).await {
            warn!(tenant = %guard.tenant(), error = %err, "could not drop database of unsaved tenant");
        }
    }

    async fn name_taken(&self, name: &str, except_id: &str) -> Result<bool> {
        let wanted = name.to_lowercase();
        Ok(self
            .tenants
            .find_all(Filter::new().contains_ignore_case(NAME_FIELD, name))
            .await?
            .iter()
            .any(|t| t.id != except_id && t.name.to_lowercase() == wanted))
    }
}
