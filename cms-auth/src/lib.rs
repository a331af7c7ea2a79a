// Authentication for the contacts backend: bcrypt credentials checked over
// HTTP Basic, plus signed JWT access tokens for the Bearer scheme.

pub mod authenticator;
pub mod credentials;
pub mod error;
pub mod jwt;
pub mod options;
pub mod password;

pub use authenticator::{AccountStore, AuthenticationResult, Authenticator, StoredAccount};
pub use credentials::Credentials;
pub use error::AuthError;
pub use jwt::{AccessClaims, JwtCodec};
pub use options::{AuthOptions, JwtAlgorithm, JwtOptions};
pub use password::{hash_password, verify_password};
