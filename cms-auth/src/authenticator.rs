// Resolves request credentials into a principal.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use cms_core::{Principal, Role, TenantId};
use serde::Serialize;
use tracing::debug;

use crate::credentials::Credentials;
use crate::error::AuthError;
use crate::jwt::JwtCodec;
use crate::options::AuthOptions;
use crate::password::verify_password;

/// What the authenticator needs to know about an account.
#[derive(Clone, Debug)]
pub struct StoredAccount {
    pub id: TenantId,
    pub username: String,
    pub password_hash: String,
    pub role: Role,
}

impl StoredAccount {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id.clone(), self.username.clone(), self.role.clone())
    }
}

/// Account lookup, implemented by whoever owns the tenant records.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_username(&self, username: &str) -> Result<Option<StoredAccount>>;

    async fn find_by_id(&self, id: &TenantId) -> Result<Option<StoredAccount>>;
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResult {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: u64,
    pub principal: Principal,
}

pub struct Authenticator {
    store: Arc<dyn AccountStore>,
    jwt: JwtCodec,
    options: AuthOptions,
}

impl Authenticator {
    pub fn new(store: Arc<dyn AccountStore>, options: AuthOptions) -> Self {
        Self {
            store,
            jwt: JwtCodec::new(options.jwt.clone()),
            options,
        }
    }

    pub fn options(&self) -> &AuthOptions {
        &self.options
    }

    fn invalid_login(&self) -> anyhow::Error {
        AuthError::InvalidCredentials(self.options.error_message.clone()).into_anyhow()
    }

    /// Username/password check. Unknown user and wrong password fail the
    /// same way.
    pub async fn authenticate_local(&self, username: &str, password: &str) -> Result<Principal> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(self.invalid_login());
        }
        let account = self
            .store
            .find_by_username(username)
            .await?
            .ok_or_else(|| self.invalid_login())?;

        if !verify_password(password, &account.password_hash) {
            debug!(username, "password mismatch");
            return Err(self.invalid_login());
        }
        Ok(account.principal())
    }

    /// Log in and issue an access token.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthenticationResult> {
        let principal = self.authenticate_local(username, password).await?;
        let access_token = self.jwt.sign(&principal).map_err(AuthError::into_anyhow)?;
        Ok(AuthenticationResult {
            access_token,
            token_type: "Bearer",
            expires_in: self.options.jwt.access_token_expires_in.as_secs(),
            principal,
        })
    }

    /// Validate a bearer token. The account must still exist, so tokens of
    /// deleted tenants stop working immediately.
    pub async fn verify_token(&self, token: &str) -> Result<Principal> {
        let claims = self.jwt.verify(token).map_err(AuthError::into_anyhow)?;
        let id = TenantId::new(claims.sub.clone());
        let account = self
            .store
            .find_by_id(&id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken("account no longer exists".into()).into_anyhow())?;
        Ok(account.principal())
    }

    /// Resolve an optional `Authorization` header.
    ///
    /// No header means no principal; present but invalid credentials are an
    /// error.
    pub async fn resolve(&self, authorization: Option<&str>) -> Result<Option<Principal>> {
        let Some(header) = authorization else {
            return Ok(None);
        };
        let principal = match Credentials::parse(header).map_err(AuthError::into_anyhow)? {
            Credentials::Basic { username, password } => {
                self.authenticate_local(&username, &password).await?
            }
            Credentials::Bearer(token) => self.verify_token(&token).await?,
        };
        Ok(Some(principal))
    }
}
