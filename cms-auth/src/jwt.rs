// Access tokens.

use chrono::Utc;
use cms_core::{Principal, Role, TenantId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;
use crate::options::JwtOptions;

/// Claims carried by an access token. `sub` is the tenant id.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccessClaims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iss: String,
    pub aud: Vec<String>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl AccessClaims {
    pub fn principal(&self) -> Principal {
        Principal::new(TenantId::new(self.sub.clone()), self.username.clone(), self.role.clone())
    }
}

#[derive(Clone, Debug)]
pub struct JwtCodec {
    options: JwtOptions,
}

impl JwtCodec {
    pub fn new(options: JwtOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &JwtOptions {
        &self.options
    }

    pub fn claims_for(&self, principal: &Principal) -> AccessClaims {
        let now = Utc::now().timestamp();
        let ttl = i64::try_from(self.options.access_token_expires_in.as_secs()).unwrap_or(i64::MAX);
        AccessClaims {
            sub: principal.id.to_string(),
            username: principal.username.clone(),
            role: principal.role.clone(),
            iss: self.options.issuer.clone(),
            aud: self.options.audience.clone(),
            iat: now,
            exp: now.saturating_add(ttl),
            jti: Uuid::new_v4().to_string(),
        }
    }

    pub fn sign(&self, principal: &Principal) -> Result<String, AuthError> {
        self.encode(&self.claims_for(principal))
    }

    fn secret(&self) -> Result<&[u8], AuthError> {
        self.options
            .secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(AuthError::MissingSecret)
    }
}

#[cfg(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto"))]
impl JwtCodec {
    fn algorithm(&self) -> jsonwebtoken::Algorithm {
        use crate::options::JwtAlgorithm;

        match self.options.algorithm {
            JwtAlgorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            JwtAlgorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            JwtAlgorithm::HS512 => jsonwebtoken::Algorithm::HS512,
        }
    }

    pub fn encode(&self, claims: &AccessClaims) -> Result<String, AuthError> {
        use jsonwebtoken::{encode, EncodingKey, Header};

        let header = Header::new(self.algorithm());
        encode(&header, claims, &EncodingKey::from_secret(self.secret()?))
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }

    pub fn verify(&self, token: &str) -> Result<AccessClaims, AuthError> {
        use jsonwebtoken::{decode, DecodingKey, Validation};

        let mut validation = Validation::new(self.algorithm());
        validation.set_issuer(&[self.options.issuer.as_str()]);
        validation.set_audience(&self.options.audience);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);

        decode::<AccessClaims>(token, &DecodingKey::from_secret(self.secret()?), &validation)
            .map(|data| data.claims)
            .map_err(|e| AuthError::InvalidToken(e.to_string()))
    }
}

#[cfg(not(any(feature = "jwt-aws-lc-rs", feature = "jwt-rust-crypto")))]
impl JwtCodec {
    pub fn encode(&self, _claims: &AccessClaims) -> Result<String, AuthError> {
        self.secret()?;
        Err(AuthError::JwtDisabled)
    }

    pub fn verify(&self, _token: &str) -> Result<AccessClaims, AuthError> {
        Err(AuthError::JwtDisabled)
    }
}
