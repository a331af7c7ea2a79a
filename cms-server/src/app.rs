use std::sync::Arc;

use anyhow::{bail, Result};
use cms_core::{
    CmsConfig, CmsConfigSnapshot, DatabaseNaming, InterceptorPaths, PagingDefaults, StorageDriver,
    DEFAULT_DATABASE, ENV_PREFIX, TENANT_DATABASE_PREFIX,
};
use cms_store::MemoryDriver;
use tracing::info;

/// Settings every deployment starts from. Environment variables prefixed
/// with `CMS__` override them.
pub fn default_config() -> CmsConfig {
    let mut config = CmsConfig::new();

    // HTTP
    config.set("http.host", "127.0.0.1");
    config.set("http.port", "8080");

    // Storage
    config.set("storage.driver", "memory");
    config.set("mongodb.uri", "mongodb://localhost:27017");
    config.set("mongodb.database", DEFAULT_DATABASE);
    config.set("tenant.database_prefix", TENANT_DATABASE_PREFIX);

    // Request interception
    config.set("interceptor.include", "/**");
    config.set("interceptor.exclude", "/health,/error,/authentication");

    // Paging
    config.set("paginate.default", "10");
    config.set("paginate.max", "100");

    // Auth
    config.set("auth.secret", "dev-secret");
    config.set("auth.expires_in_seconds", "86400");
    config.set("admin.username", "admin");
    config.set("admin.password", "admin");

    config
}

pub fn load_config() -> CmsConfig {
    let mut config = default_config();
    config.load_env(ENV_PREFIX);
    config
}

pub fn database_naming(config: &CmsConfigSnapshot) -> DatabaseNaming {
    DatabaseNaming::new(
        config.get("mongodb.database").unwrap_or(DEFAULT_DATABASE),
        config
            .get("tenant.database_prefix")
            .unwrap_or(TENANT_DATABASE_PREFIX),
    )
}

pub fn interceptor_paths(config: &CmsConfigSnapshot) -> InterceptorPaths {
    let defaults = InterceptorPaths::default();
    match (
        config.get_list("interceptor.include"),
        config.get_list("interceptor.exclude"),
    ) {
        (None, None) => defaults,
        (include, exclude) => InterceptorPaths::new(
            include.unwrap_or_else(|| vec!["/**".to_string()]),
            exclude.unwrap_or_default(),
        ),
    }
}

pub fn paging_defaults(config: &CmsConfigSnapshot) -> PagingDefaults {
    let mut paging = PagingDefaults::default();
    if let Some(size) = config.get_u64("paginate.default") {
        paging.default_size = size;
    }
    if let Some(max) = config.get_u64("paginate.max") {
        paging.max_size = max;
    }
    paging
}

pub async fn storage_driver(config: &CmsConfigSnapshot) -> Result<Arc<dyn StorageDriver>> {
    let kind = config.get("storage.driver").unwrap_or("memory");
    match kind {
        "memory" => {
            info!("using in-memory storage");
            Ok(Arc::new(MemoryDriver::new()))
        }
        #[cfg(feature = "mongodb")]
        "mongodb" => {
            let uri = config.get("mongodb.uri").unwrap_or("mongodb://localhost:27017");
            info!(uri, "connecting to MongoDB");
            Ok(Arc::new(cms_store::MongoDriver::connect(uri).await?))
        }
        other => bail!("unsupported storage driver '{other}'"),
    }
}
