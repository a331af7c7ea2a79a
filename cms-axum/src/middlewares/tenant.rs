use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use cms_core::{Principal, TenantInterceptor};

use crate::error::CmsAxumError;

/// Run the rest of the stack under the tenant interceptor.
///
/// Must sit inside [`super::authenticate`] so the principal extension is
/// already in place.
pub async fn bind_tenant(
    State(interceptor): State<Arc<TenantInterceptor>>,
    req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path().to_owned();
    let principal = req.extensions().get::<Principal>().cloned();

    match interceptor
        .intercept(&path, principal.as_ref(), next.run(req))
        .await
    {
        Ok(response) => response,
        Err(err) => CmsAxumError::from(err).into_response(),
    }
}
