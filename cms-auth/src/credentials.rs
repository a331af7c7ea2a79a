// Authorization header parsing.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;

use crate::error::AuthError;

#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    Basic { username: String, password: String },
    Bearer(String),
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Credentials::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"***")
                .finish(),
            Credentials::Bearer(_) => f.write_str("Bearer(***)"),
        }
    }
}

impl Credentials {
    /// Parse an `Authorization` header value.
    ///
    /// `Basic` and `Bearer` (or `JWT`) schemes are recognized, case
    /// insensitively. Anything else is malformed.
    pub fn parse(header: &str) -> Result<Self, AuthError> {
        let header = header.trim();
        let (scheme, rest) = header.split_once(' ').ok_or(AuthError::MalformedHeader)?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(AuthError::MalformedHeader);
        }

        if scheme.eq_ignore_ascii_case("basic") {
            let decoded = STANDARD.decode(rest).map_err(|_| AuthError::MalformedHeader)?;
            let decoded = String::from_utf8(decoded).map_err(|_| AuthError::MalformedHeader)?;
            let (username, password) = decoded.split_once(':').ok_or(AuthError::MalformedHeader)?;
            Ok(Credentials::Basic {
                username: username.to_string(),
                password: password.to_string(),
            })
        } else if scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("jwt") {
            Ok(Credentials::Bearer(rest.to_string()))
        } else {
            Err(AuthError::MalformedHeader)
        }
    }

    /// Header value for Basic credentials.
    pub fn basic_header(username: &str, password: &str) -> String {
        format!("Basic {}", STANDARD.encode(format!("{username}:{password}")))
    }
}
