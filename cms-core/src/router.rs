//! Per-operation database selection.
//!
//! Repositories never carry a database name. They hold a [`DatabaseRouter`]
//! and ask it on every call, so whatever tenant the current request scope is
//! bound to is the one whose database gets used.

use std::fmt;

use tracing::debug;

use crate::tenant::{TenantContext, TenantId};

pub const DEFAULT_DATABASE: &str = "default";
pub const TENANT_DATABASE_PREFIX: &str = "tenant_";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogicalDatabase {
    Default(String),
    Tenant { tenant: TenantId, name: String },
}

impl LogicalDatabase {
    pub fn name(&self) -> &str {
        match self {
            LogicalDatabase::Default(name) => name,
            LogicalDatabase::Tenant { name, .. } => name,
        }
    }

    pub fn tenant(&self) -> Option<&TenantId> {
        match self {
            LogicalDatabase::Default(_) => None,
            LogicalDatabase::Tenant { tenant, .. } => Some(tenant),
        }
    }
}

impl fmt::Display for LogicalDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Deterministic mapping from tenant identity to database name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseNaming {
    default_database: String,
    tenant_prefix: String,
}

impl Default for DatabaseNaming {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE, TENANT_DATABASE_PREFIX)
    }
}

impl DatabaseNaming {
    pub fn new(default_database: impl Into<String>, tenant_prefix: impl Into<String>) -> Self {
        Self {
            default_database: default_database.into(),
            tenant_prefix: tenant_prefix.into(),
        }
    }

    pub fn default_database(&self) -> LogicalDatabase {
        LogicalDatabase::Default(self.default_database.clone())
    }

    pub fn tenant_database(&self, tenant: &TenantId) -> LogicalDatabase {
        LogicalDatabase::Tenant {
            tenant: tenant.clone(),
            name: format!("{}{}", self.tenant_prefix, tenant.as_str()),
        }
    }

    pub fn resolve(&self, tenant: Option<&TenantId>) -> LogicalDatabase {
        match tenant {
            Some(tenant) => self.tenant_database(tenant),
            None => self.default_database(),
        }
    }
}

/// Answers "which database does the current operation use?".
pub trait DatabaseRouter: Send + Sync {
    fn active_database(&self) -> LogicalDatabase;
}

/// Router that follows the request-scoped [`TenantContext`] binding.
#[derive(Debug, Clone, Default)]
pub struct TenantDatabaseRouter {
    naming: DatabaseNaming,
}

impl TenantDatabaseRouter {
    pub fn new(naming: DatabaseNaming) -> Self {
        Self { naming }
    }

    pub fn naming(&self) -> &DatabaseNaming {
        &self.naming
    }
}

impl DatabaseRouter for TenantDatabaseRouter {
    fn active_database(&self) -> LogicalDatabase {
        let tenant = TenantContext::get();
        let database = self.naming.resolve(tenant.as_ref());
        match &tenant {
            Some(tenant) => debug!(tenant = %tenant, database = %database, "using tenant database"),
            None => debug!(database = %database, "no tenant bound, using default database"),
        }
        database
    }
}

/// Router pinned to one database regardless of the request scope.
///
/// Administrative records (tenants) always live in the default database.
#[derive(Debug, Clone)]
pub struct FixedDatabaseRouter {
    database: LogicalDatabase,
}

impl FixedDatabaseRouter {
    pub fn new(database: LogicalDatabase) -> Self {
        Self { database }
    }

    pub fn default_database(naming: &DatabaseNaming) -> Self {
        Self::new(naming.default_database())
    }
}

impl DatabaseRouter for FixedDatabaseRouter {
    fn active_database(&self) -> LogicalDatabase {
        self.database.clone()
    }
}
