use std::any::Any;
use std::sync::Arc;

use axum::body::Body;
use axum::handler::Handler;
use axum::http::Request;
use axum::middleware::from_fn_with_state;
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use cms_auth::Authenticator;
use cms_core::{CmsError, TenantInterceptor};
use tokio::net::{TcpListener, ToSocketAddrs};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span};

use crate::error::{error_response, INTERNAL_ERROR_MESSAGE};
use crate::middlewares;

/// Router builder that wires authentication and tenant binding in front of
/// every mounted route.
pub struct CmsAxumApp {
    router: Router<()>,
    authenticator: Arc<Authenticator>,
    interceptor: Arc<TenantInterceptor>,
}

impl CmsAxumApp {
    pub fn new(authenticator: Arc<Authenticator>, interceptor: Arc<TenantInterceptor>) -> Self {
        Self {
            router: Router::new(),
            authenticator,
            interceptor,
        }
    }

    pub fn use_router(mut self, path: &str, router: Router<()>) -> Self {
        self.router = self.router.nest(path, router);
        self
    }

    /// Mount a GET handler at `path`.
    pub fn service<H, T>(mut self, path: &str, handler: H) -> Self
    where
        H: Handler<T, ()> + Clone + Send + 'static,
        T: 'static,
    {
        self.router = self.router.route(path, get(handler));
        self
    }

    /// Final router with the middleware stack applied, outermost first:
    /// request id, tracing, panic guard, authentication, tenant binding.
    pub fn into_router(self) -> Router<()> {
        self.router
            .layer(from_fn_with_state(self.interceptor, middlewares::bind_tenant))
            .layer(from_fn_with_state(self.authenticator, middlewares::authenticate))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request<Body>| {
                let request_id = req
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!("request", method = %req.method(), uri = %req.uri(), request_id)
            }))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    pub async fn listen<A>(self, addr: A) -> anyhow::Result<()>
    where
        A: ToSocketAddrs,
    {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");
        axum::serve(listener, self.into_router()).await?;
        Ok(())
    }
}

fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    error!(detail, "handler panicked");
    error_response(&CmsError::general_error(INTERNAL_ERROR_MESSAGE))
}
