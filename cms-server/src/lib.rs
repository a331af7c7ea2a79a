mod app;
pub mod services;
mod utils;

use std::sync::Arc;

use anyhow::Result;
use axum::Router;
use cms_axum::CmsAxumApp;
use cms_core::{CmsConfigSnapshot, StorageDriver, TenantInterceptor};

pub use app::{default_config, load_config};
pub use services::{AppState, SharedState};

/// A configured server, ready to serve or to hand its router to tests.
pub struct ContactsServer {
    pub config: CmsConfigSnapshot,
    pub state: SharedState,
    app: CmsAxumApp,
}

impl ContactsServer {
    pub fn router(self) -> Router {
        self.app.into_router()
    }

    pub fn address(&self) -> String {
        let host = self.config.get("http.host").unwrap_or("127.0.0.1");
        let port = self.config.get("http.port").unwrap_or("8080");
        format!("{host}:{port}")
    }

    pub async fn listen(self) -> Result<()> {
        let addr = self.address();
        self.app.listen(addr).await
    }
}

/// Build from defaults plus `CMS__*` environment overrides.
pub async fn build() -> Result<ContactsServer> {
    let config = load_config().snapshot();
    let driver = app::storage_driver(&config).await?;
    build_with(config, driver).await
}

pub async fn build_with(config: CmsConfigSnapshot, driver: Arc<dyn StorageDriver>) -> Result<ContactsServer> {
    let state = services::configure(&config, driver)?;
    state.tenants.ensure_indexes().await?;

    if let (Some(username), Some(password)) = (config.get("admin.username"), config.get("admin.password")) {
        state.tenants.ensure_admin(username, password).await?;
    }

    let interceptor = Arc::new(TenantInterceptor::new(app::interceptor_paths(&config)));
    let mut app = CmsAxumApp::new(Arc::clone(&state.authenticator), interceptor);
    for (path, router) in services::routes(&state) {
        app = app.use_router(path, router);
    }
    let app = app.service("/health", || async { "ok" });

    Ok(ContactsServer { config, state, app })
}
