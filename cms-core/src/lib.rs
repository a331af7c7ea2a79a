//! cms-core: tenant isolation for the contacts backend.
//!
//! Everything here is transport-agnostic. The HTTP layer authenticates the
//! caller and hands a [`Principal`] to the [`TenantInterceptor`]; repositories
//! ask a [`DatabaseRouter`] where to read and write; [`TenantLifecycle`]
//! creates and drops tenant databases through a [`StorageDriver`].

pub mod config;
pub mod errors;
pub mod interceptor;
pub mod lifecycle;
pub mod paging;
pub mod router;
pub mod storage;
pub mod tenant;

pub use config::{CmsConfig, CmsConfigSnapshot, ENV_PREFIX};
pub use errors::{CmsError, CmsResult, ErrorKind};
pub use interceptor::{Admission, InterceptorPaths, PathPattern, TenantInterceptor};
pub use lifecycle::{
    LifecycleError, TenantGuard, TenantLifecycle, CATEGORIES_COLLECTION, CONTACTS_COLLECTION,
    TENANT_COLLECTIONS,
};
pub use paging::{Page, PageRequest, PagingDefaults, Sort, SortOrder};
pub use router::{
    DatabaseNaming, DatabaseRouter, FixedDatabaseRouter, LogicalDatabase, TenantDatabaseRouter,
    DEFAULT_DATABASE, TENANT_DATABASE_PREFIX,
};
pub use storage::{Condition, DuplicateKey, Filter, Query, StorageDriver, UniqueIndex, ID_FIELD};
pub use tenant::{InvalidTenantId, Principal, Role, TenantContext, TenantId, ANONYMOUS_USERNAME};
