//! Request admission and tenant binding.
//!
//! The interceptor decides, per request, whether a path is tenant-scoped and
//! if so which tenant the request acts for. It then runs the handler inside a
//! fresh [`TenantContext`] scope so the binding is gone once the handler is
//! finished, however it finishes.

use std::future::Future;

use tracing::{debug, warn};

use crate::errors::CmsError;
use crate::tenant::{Principal, TenantContext, TenantId};

/// Ant-style path pattern: `/**` matches everything, `/prefix/**` matches
/// the prefix and anything under it, anything else is an exact match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern(String);

impl PathPattern {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self(pattern.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        match self.0.strip_suffix("/**") {
            Some("") => true,
            Some(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix)
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            None => path == normalize(&self.0),
        }
    }
}

fn normalize(path: &str) -> &str {
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Which paths the interceptor applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterceptorPaths {
    pub include: Vec<PathPattern>,
    pub exclude: Vec<PathPattern>,
}

impl Default for InterceptorPaths {
    fn default() -> Self {
        Self::new(["/**"], ["/health", "/error", "/authentication"])
    }
}

impl InterceptorPaths {
    pub fn new<I, E, S, T>(include: I, exclude: E) -> Self
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: Into<String>,
        T: Into<String>,
    {
        Self {
            include: include.into_iter().map(|p| PathPattern::new(p)).collect(),
            exclude: exclude.into_iter().map(|p| PathPattern::new(p)).collect(),
        }
    }

    pub fn intercepts(&self, path: &str) -> bool {
        self.include.iter().any(|p| p.matches(path)) && !self.exclude.iter().any(|p| p.matches(path))
    }
}

/// Outcome of the pre-handler decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Path is not tenant-scoped. The handler runs with no binding.
    Bypass,
    /// No usable principal.
    Reject,
    /// Administrators act on the default database.
    Admin,
    Tenant(TenantId),
}

#[derive(Debug, Clone, Default)]
pub struct TenantInterceptor {
    paths: InterceptorPaths,
}

impl TenantInterceptor {
    pub fn new(paths: InterceptorPaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &InterceptorPaths {
        &self.paths
    }

    pub fn admit(&self, path: &str, principal: Option<&Principal>) -> Admission {
        if !self.paths.intercepts(path) {
            return Admission::Bypass;
        }
        match principal {
            None => Admission::Reject,
            Some(p) if p.is_anonymous() => Admission::Reject,
            Some(p) if p.is_admin() => Admission::Admin,
            Some(p) => Admission::Tenant(p.id.clone()),
        }
    }

    /// Run `handler` for a request on `path`.
    ///
    /// Rejected requests never reach the handler and produce a
    /// `NotAuthenticated` error. Every admitted request gets its own scope,
    /// so nothing bound by an earlier request on the same worker is visible.
    pub async fn intercept<F, T>(
        &self,
        path: &str,
        principal: Option<&Principal>,
        handler: F,
    ) -> Result<T, CmsError>
    where
        F: Future<Output = T>,
    {
        let admission = self.admit(path, principal);
        if admission == Admission::Reject {
            warn!(path, "rejecting request without an authenticated principal");
            return Err(CmsError::not_authenticated("Authentication required"));
        }

        let output = TenantContext::scope(async move {
            match admission {
                Admission::Tenant(tenant) => {
                    debug!(path, tenant = %tenant, "binding tenant for request");
                    TenantContext::set(tenant);
                }
                Admission::Admin => {
                    debug!(path, "admin request, no tenant bound");
                    TenantContext::clear();
                }
                Admission::Bypass | Admission::Reject => {}
            }

            let output = handler.await;
            TenantContext::clear();
            output
        })
        .await;

        Ok(output)
    }
}
