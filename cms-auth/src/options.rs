// Authentication options.

use std::time::Duration;

use cms_core::CmsConfigSnapshot;
use serde::{Deserialize, Serialize};

/// HMAC signing algorithms accepted for access tokens.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub enum JwtAlgorithm {
    #[default]
    HS256,
    HS384,
    HS512,
}

impl JwtAlgorithm {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "HS256" => Some(Self::HS256),
            "HS384" => Some(Self::HS384),
            "HS512" => Some(Self::HS512),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtOptions {
    /// Signing secret. Token issuance fails until one is configured.
    pub secret: Option<String>,
    pub algorithm: JwtAlgorithm,
    pub issuer: String,
    pub audience: Vec<String>,
    #[serde(with = "humantime_serde")]
    pub access_token_expires_in: Duration,
}

impl Default for JwtOptions {
    fn default() -> Self {
        Self {
            secret: None,
            algorithm: JwtAlgorithm::HS256,
            issuer: "contacts-backend".to_string(),
            audience: vec!["contacts-api".to_string()],
            access_token_expires_in: Duration::from_secs(60 * 60 * 24),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AuthOptions {
    pub jwt: JwtOptions,
    /// bcrypt cost factor for new password hashes.
    pub hash_cost: u32,
    /// Message returned for every failed login, whatever the reason.
    pub error_message: String,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            jwt: JwtOptions::default(),
            hash_cost: bcrypt::DEFAULT_COST,
            error_message: "Invalid login".to_string(),
        }
    }
}

impl AuthOptions {
    /// Read `auth.*` keys, keeping defaults for anything missing.
    pub fn from_config(config: &CmsConfigSnapshot) -> Self {
        let mut options = Self::default();
        let jwt = &mut options.jwt;

        if let Some(secret) = config.get_string("auth.secret").filter(|s| !s.is_empty()) {
            jwt.secret = Some(secret);
        }
        if let Some(alg) = config.get("auth.algorithm").and_then(JwtAlgorithm::parse) {
            jwt.algorithm = alg;
        }
        if let Some(issuer) = config.get_string("auth.issuer") {
            jwt.issuer = issuer;
        }
        if let Some(audience) = config.get_list("auth.audience").filter(|a| !a.is_empty()) {
            jwt.audience = audience;
        }
        if let Some(secs) = config.get_u64("auth.expires_in_seconds") {
            jwt.access_token_expires_in = Duration::from_secs(secs);
        }
        if let Some(cost) = config.get_u64("auth.hash_cost").and_then(|c| u32::try_from(c).ok()) {
            options.hash_cost = cost;
        }
        options
    }
}
