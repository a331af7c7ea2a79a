use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use cms_auth::{AuthOptions, Authenticator};
use cms_core::{
    CmsConfigSnapshot, FixedDatabaseRouter, StorageDriver, TenantDatabaseRouter, TenantLifecycle,
    UniqueIndex, CATEGORIES_COLLECTION, CONTACTS_COLLECTION,
};
use cms_store::Repository;

use crate::app::{database_naming, paging_defaults};

pub mod authentication;
pub mod categories;
pub mod contacts;
pub mod tenants;
pub mod types;

pub use types::{AppState, SharedState};

/// Wire repositories, services and the authenticator over one storage
/// driver.
pub fn configure(config: &CmsConfigSnapshot, driver: Arc<dyn StorageDriver>) -> Result<SharedState> {
    let naming = database_naming(config);
    let tenant_router = Arc::new(TenantDatabaseRouter::new(naming.clone()));
    let admin_router = Arc::new(FixedDatabaseRouter::default_database(&naming));

    let contacts_repo = Repository::new(Arc::clone(&driver), tenant_router.clone(), CONTACTS_COLLECTION);
    let categories_repo = Repository::new(Arc::clone(&driver), tenant_router, CATEGORIES_COLLECTION);
    let tenants_repo = Repository::new(Arc::clone(&driver), admin_router, tenants::TENANTS_COLLECTION);

    let auth_options = AuthOptions::from_config(config);
    let lifecycle = Arc::new(
        TenantLifecycle::new(driver, naming)
            .with_unique_index(
                CONTACTS_COLLECTION,
                UniqueIndex::new(contacts::contacts_shared::PHONE_FIELD),
            )
            .with_unique_index(
                CATEGORIES_COLLECTION,
                UniqueIndex::new(categories::CATEGORY_NAME_FIELD).ignore_case(),
            ),
    );
    let tenants = tenants::TenantsService::new(tenants_repo, lifecycle, auth_options.hash_cost);

    let accounts = Arc::new(tenants::TenantAccounts::new(tenants.clone()));
    let authenticator = Arc::new(Authenticator::new(accounts, auth_options));

    Ok(Arc::new(AppState {
        contacts: contacts::ContactsService::new(contacts_repo.clone(), categories_repo.clone()),
        categories: categories::CategoriesService::new(categories_repo, contacts_repo),
        tenants,
        authenticator,
        paging: paging_defaults(config),
    }))
}

pub fn routes(state: &SharedState) -> Vec<(&'static str, Router)> {
    vec![
        ("/authentication", authentication::router(Arc::clone(state))),
        ("/contacts", contacts::router(Arc::clone(state))),
        ("/categories", categories::router(Arc::clone(state))),
        ("/tenants", tenants::router(Arc::clone(state))),
    ]
}
