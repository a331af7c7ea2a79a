use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use cms_auth::Authenticator;
use cms_core::{CmsError, ErrorKind};
use tracing::{debug, warn};

use crate::error::CmsAxumError;

/// Resolve the `Authorization` header into a [`cms_core::Principal`] request
/// extension.
///
/// This never rejects on its own: missing or invalid credentials leave the
/// request without a principal and the tenant interceptor decides whether the
/// path needs one. Only a failing account lookup ends the request here.
pub async fn authenticate(
    State(authenticator): State<Arc<Authenticator>>,
    mut req: Request,
    next: Next,
) -> Response {
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);

    match authenticator.resolve(header.as_deref()).await {
        Ok(Some(principal)) => {
            debug!(username = %principal.username, role = %principal.role, "authenticated");
            req.extensions_mut().insert(principal);
        }
        Ok(None) => {}
        Err(err) if CmsError::kind_of(&err) == Some(ErrorKind::NotAuthenticated) => {
            debug!(error = %err, "credentials rejected, continuing without a principal");
        }
        Err(err) => {
            warn!(error = %err, "authentication lookup failed");
            return CmsAxumError::from(err).into_response();
        }
    }

    next.run(req).await
}
