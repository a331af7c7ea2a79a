//! Core multi-tenant types.
//!
//! `TenantContext` is the request-scoped binding of "which tenant is this
//! request acting for". It lives in task-local storage: a binding only exists
//! inside [`TenantContext::scope`] and disappears with the scoped future, so a
//! reused worker can never inherit a previous request's tenant.

use std::cell::RefCell;
use std::fmt;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Opaque tenant identifier.
///
/// Assigned once when the tenant record is created and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(String);

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InvalidTenantId {
    #[error("tenant id must not be empty")]
    Empty,

    #[error("tenant id '{0}' may only contain ASCII letters, digits, '-' and '_'")]
    IllegalCharacters(String),
}

impl TenantId {
    /// Wrap a string without checking it. Use [`TenantId::parse`] for
    /// identifiers that came from outside the process.
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    /// Identifiers end up inside database names, so only a conservative
    /// character set is accepted.
    pub fn parse(id: &str) -> Result<Self, InvalidTenantId> {
        let id = id.trim();
        if id.is_empty() {
            return Err(InvalidTenantId::Empty);
        }
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(InvalidTenantId::IllegalCharacters(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role carried by a tenant record and by the authenticated principal.
///
/// Parsed case-insensitively; anything that is not `ADMIN` is an ordinary
/// tenant role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    User,
    Other(String),
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::User => "USER",
            Role::Other(s) => s.as_str(),
        }
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.eq_ignore_ascii_case("ADMIN") {
            Role::Admin
        } else if trimmed.eq_ignore_ascii_case("USER") {
            Role::User
        } else {
            Role::Other(trimmed.to_ascii_uppercase())
        }
    }
}

impl From<&str> for Role {
    fn from(value: &str) -> Self {
        Role::from(value.to_string())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ANONYMOUS_USERNAME: &str = "anonymousUser";

/// The authenticated caller, as handed over by the authentication layer.
///
/// Tenants log in as themselves, so the principal's id *is* the tenant id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: TenantId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: TenantId, username: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            username: username.into(),
            role,
        }
    }

    /// Placeholder some authentication layers install for unauthenticated
    /// callers. The interceptor treats it exactly like a missing principal.
    pub fn anonymous() -> Self {
        Self {
            id: TenantId::new(ANONYMOUS_USERNAME),
            username: ANONYMOUS_USERNAME.to_string(),
            role: Role::Other("ANONYMOUS".to_string()),
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.username == ANONYMOUS_USERNAME
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

tokio::task_local! {
    static CURRENT_TENANT: RefCell<Option<TenantId>>;
}

/// Request-scoped tenant binding.
///
/// All operations are total. Outside of a scope `get()` reports "unset" and
/// `set()`/`clear()` do nothing.
pub struct TenantContext;

impl TenantContext {
    /// Run `fut` inside a fresh, unset tenant scope.
    ///
    /// The binding is destroyed when `fut` completes, returns an error,
    /// panics, or is dropped before completion.
    pub fn scope<F>(fut: F) -> impl Future<Output = F::Output>
    where
        F: Future,
    {
        CURRENT_TENANT.scope(RefCell::new(None), fut)
    }

    pub fn set(tenant: TenantId) {
        let bound = CURRENT_TENANT.try_with(|slot| {
            *slot.borrow_mut() = Some(tenant);
        });
        if bound.is_err() {
            debug!("TenantContext::set called outside of a request scope; ignored");
        }
    }

    pub fn get() -> Option<TenantId> {
        CURRENT_TENANT
            .try_with(|slot| slot.borrow().clone())
            .ok()
            .flatten()
    }

    pub fn clear() {
        let _ = CURRENT_TENANT.try_with(|slot| slot.borrow_mut().take());
    }

    /// Whether the caller is running inside a request scope at all.
    pub fn in_scope() -> bool {
        CURRENT_TENANT.try_with(|_| ()).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tokio::sync::Barrier;

    use super::*;

    #[test]
    fn parse_rejects_empty_and_unsafe_ids() {
        assert_eq!(TenantId::parse("  "), Err(InvalidTenantId::Empty));
        assert!(matches!(
            TenantId::parse("a/b"),
            Err(InvalidTenantId::IllegalCharacters(_))
        ));
        assert!(matches!(
            TenantId::parse("a.b"),
            Err(InvalidTenantId::IllegalCharacters(_))
        ));
        assert_eq!(TenantId::parse("abc_123-x").unwrap().as_str(), "abc_123-x");
    }

    #[test]
    fn roles_parse_case_insensitively() {
        assert_eq!(Role::from("admin"), Role::Admin);
        assert_eq!(Role::from("User"), Role::User);
        assert_eq!(Role::from("editor"), Role::Other("EDITOR".into()));

        let json = serde_json::to_string(&Role::Admin).unwrap();
        assert_eq!(json, "\"ADMIN\"");
        let back: Role = serde_json::from_str("\"admin\"").unwrap();
        assert!(back.is_admin());
    }

    #[test]
    fn operations_outside_a_scope_are_noops() {
        assert!(!TenantContext::in_scope());
        TenantContext::set(TenantId::new("abc123"));
        assert_eq!(TenantContext::get(), None);
        TenantContext::clear();
    }

    #[tokio::test]
    async fn set_get_clear_inside_a_scope() {
        TenantContext::scope(async {
            assert!(TenantContext::in_scope());
            assert_eq!(TenantContext::get(), None);

            TenantContext::set(TenantId::new("abc123"));
            assert_eq!(TenantContext::get(), Some(TenantId::new("abc123")));

            TenantContext::clear();
            assert_eq!(TenantContext::get(), None);
        })
        .await;
    }

    #[tokio::test]
    async fn binding_does_not_outlive_the_scope() {
        TenantContext::scope(async {
            TenantContext::set(TenantId::new("abc123"));
        })
        .await;

        assert_eq!(TenantContext::get(), None);

        // A following scope on the same worker starts unset.
        TenantContext::scope(async {
            assert_eq!(TenantContext::get(), None);
        })
        .await;
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_scopes_never_observe_each_other() {
        let barrier = Arc::new(Barrier::new(2));

        let spawn_for = |id: &'static str| {
            let barrier = Arc::clone(&barrier);
            tokio::spawn(TenantContext::scope(async move {
                TenantContext::set(TenantId::new(id));
                barrier.wait().await;
                let mut seen = Vec::new();
                for _ in 0..50 {
                    seen.push(TenantContext::get());
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
                seen
            }))
        };

        let t1 = spawn_for("t1");
        let t2 = spawn_for("t2");

        let seen1 = t1.await.unwrap();
        let seen2 = t2.await.unwrap();

        assert!(seen1.iter().all(|t| t.as_ref().map(TenantId::as_str) == Some("t1")));
        assert!(seen2.iter().all(|t| t.as_ref().map(TenantId::as_str) == Some("t2")));
    }
}
