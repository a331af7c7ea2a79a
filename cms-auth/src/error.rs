use cms_core::CmsError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredentials(String),

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("invalid access token: {0}")]
    InvalidToken(String),

    #[error("JWT secret is not configured")]
    MissingSecret,

    #[error("JWT support is disabled (enable one of: jwt-aws-lc-rs, jwt-rust-crypto)")]
    JwtDisabled,

    #[error("password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl From<AuthError> for CmsError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials(message) => CmsError::not_authenticated(message),
            AuthError::MalformedHeader | AuthError::InvalidToken(_) => {
                CmsError::not_authenticated(err.to_string())
            }
            AuthError::MissingSecret | AuthError::JwtDisabled | AuthError::Hashing(_) => {
                CmsError::general_error("Internal server error").with_source(anyhow::Error::new(err))
            }
        }
    }
}

impl AuthError {
    pub fn into_anyhow(self) -> anyhow::Error {
        CmsError::from(self).into_anyhow()
    }
}
