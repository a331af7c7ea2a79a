//! Tenant database provisioning and teardown.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::{info, warn};

use crate::errors::CmsError;
use crate::router::{DatabaseNaming, LogicalDatabase};
use crate::storage::{StorageDriver, UniqueIndex};
use crate::tenant::{Role, TenantId};

pub const CONTACTS_COLLECTION: &str = "contacts";
pub const CATEGORIES_COLLECTION: &str = "categories";

/// Collections every non-admin tenant database starts with.
pub const TENANT_COLLECTIONS: [&str; 2] = [CONTACTS_COLLECTION, CATEGORIES_COLLECTION];

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to provision database '{database}' for tenant '{tenant}': {cause}")]
    Provisioning {
        tenant: TenantId,
        database: String,
        cause: anyhow::Error,
    },

    #[error("failed to drop database '{database}' for tenant '{tenant}': {cause}")]
    Deprovisioning {
        tenant: TenantId,
        database: String,
        cause: anyhow::Error,
    },
}

impl From<LifecycleError> for CmsError {
    fn from(err: LifecycleError) -> Self {
        let message = match &err {
            LifecycleError::Provisioning { tenant, .. } => {
                format!("Could not provision storage for tenant '{tenant}'")
            }
            LifecycleError::Deprovisioning { tenant, .. } => {
                format!("Could not remove storage for tenant '{tenant}'")
            }
        };
        CmsError::unavailable(message).with_source(anyhow::Error::new(err))
    }
}

type LockTable = Arc<Mutex<HashMap<TenantId, Arc<AsyncMutex<()>>>>>;

/// Exclusive hold on one tenant's lifecycle.
///
/// Provisioning, deprovisioning and the record writes around them happen
/// while a guard is held, so two of them never interleave for the same
/// tenant. The tenant's lock entry is evicted when the last guard or
/// waiter for it goes away.
pub struct TenantGuard {
    tenant: TenantId,
    lock: Option<OwnedMutexGuard<()>>,
    table: LockTable,
}

impl TenantGuard {
    pub fn tenant(&self) -> &TenantId {
        &self.tenant
    }
}

impl Drop for TenantGuard {
    fn drop(&mut self) {
        let mut locks = self.table.lock();
        // The held lock owns a reference to the slot; release it before counting.
        drop(self.lock.take());
        // One reference is held by the table itself.
        let idle = locks
            .get(&self.tenant)
            .is_some_and(|slot| Arc::strong_count(slot) == 1);
        if idle {
            locks.remove(&self.tenant);
        }
    }
}

pub struct TenantLifecycle {
    driver: Arc<dyn StorageDriver>,
    naming: DatabaseNaming,
    indexes: Vec<(&'static str, UniqueIndex)>,
    locks: LockTable,
}

impl TenantLifecycle {
    pub fn new(driver: Arc<dyn StorageDriver>, naming: DatabaseNaming) -> Self {
        Self {
            driver,
            naming,
            indexes: Vec::new(),
            locks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Declare a unique index that provisioning creates in every tenant
    /// database.
    pub fn with_unique_index(mut self, collection: &'static str, index: UniqueIndex) -> Self {
        self.indexes.push((collection, index));
        self
    }

    pub fn naming(&self) -> &DatabaseNaming {
        &self.naming
    }

    pub async fn lock(&self, tenant: &TenantId) -> TenantGuard {
        // Declared before the slot so a cancelled wait releases the slot
        // before the eviction check runs.
        let mut guard = TenantGuard {
            tenant: tenant.clone(),
            lock: None,
            table: Arc::clone(&self.locks),
        };
        let slot = {
            let mut locks = self.locks.lock();
            Arc::clone(locks.entry(tenant.clone()).or_default())
        };
        guard.lock = Some(slot.lock_owned().await);
        guard
    }

    /// Tenants with a held or awaited lifecycle lock.
    pub fn locked_tenants(&self) -> usize {
        self.locks.lock().len()
    }

    /// Create the tenant's database with its standard collections.
    ///
    /// Administrators get nothing and `Ok(None)` comes back. Collections that
    /// already exist are left alone, so running this twice is harmless.
    pub async fn provision(
        &self,
        guard: &TenantGuard,
        role: &Role,
    ) -> Result<Option<LogicalDatabase>, LifecycleError> {
        let tenant = guard.tenant();
        if role.is_admin() {
            info!(tenant = %tenant, "admin tenant, skipping database provisioning");
            return Ok(None);
        }

        let database = self.naming.tenant_database(tenant);
        let fail = |cause: anyhow::Error| LifecycleError::Provisioning {
            tenant: tenant.clone(),
            database: database.name().to_string(),
            cause,
        };

        for collection in TENANT_COLLECTIONS {
            let exists = self
                .driver
                .collection_exists(database.name(), collection)
                .await
                .map_err(&fail)?;
            if exists {
                continue;
            }
            self.driver
                .create_collection(database.name(), collection)
                .await
                .map_err(&fail)?;
        }
        for (collection, index) in &self.indexes {
            self.driver
                .create_unique_index(database.name(), collection, index)
                .await
                .map_err(&fail)?;
        }

        info!(tenant = %tenant, database = %database, "provisioned tenant database");
        Ok(Some(database))
    }

    /// Drop the tenant's database. A database that was never created is not
    /// an error.
    pub async fn deprovision(&self, guard: &TenantGuard) -> Result<(), LifecycleError> {
        let tenant = guard.tenant();
        let database = self.naming.tenant_database(tenant);

        self.driver
            .drop_database(database.name())
            .await
            .map_err(|cause| {
                warn!(tenant = %tenant, database = %database, error = %cause, "dropping tenant database failed");
                LifecycleError::Deprovisioning {
                    tenant: tenant.clone(),
                    database: database.name().to_string(),
                    cause,
                }
            })?;

        info!(tenant = %tenant, database = %database, "dropped tenant database");
        Ok(())
    }

    pub async fn is_provisioned(&self, tenant: &TenantId) -> anyhow::Result<bool> {
        let database = self.naming.tenant_database(tenant);
        for collection in TENANT_COLLECTIONS {
            if !self
                .driver
                .collection_exists(database.name(), collection)
                .await?
            {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
