pub mod tenants_accounts;
pub mod tenants_routes;
pub mod tenants_schema;
pub mod tenants_service;
pub mod tenants_shared;

pub use tenants_accounts::TenantAccounts;
pub use tenants_routes::router;
pub use tenants_service::TenantsService;
pub use tenants_shared::{Tenant, TenantView, TENANTS_COLLECTION};
