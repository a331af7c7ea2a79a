use axum::{extract::FromRequestParts, http::request::Parts};
use cms_core::{CmsError, Principal, Role};

use crate::error::CmsAxumError;

/// The principal installed by the authentication middleware.
///
/// Rejects with 401 when the request carries no credentials.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

impl CurrentPrincipal {
    /// Require exactly `role`. Administrators do not implicitly hold tenant
    /// roles, so an admin calling a tenant-only operation is refused too.
    pub fn require(&self, role: Role) -> Result<&Principal, CmsAxumError> {
        if self.0.role == role {
            Ok(&self.0)
        } else {
            Err(CmsError::forbidden("Access denied").into())
        }
    }
}

impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = CmsAxumError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .filter(|p| !p.is_anonymous())
            .cloned()
            .map(CurrentPrincipal)
            .ok_or_else(|| CmsError::not_authenticated("Authentication required").into())
    }
}
