//! Token payload returned to a client after a successful login.

use serde::{Deserialize, Serialize};

use super::CONNECTION_TOKEN_TYPE;

/// Access token and its type.
///
/// ```json
/// {
///   "access_token": "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...",
///   "token_type": "Bearer"
/// }
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthBody {
    pub access_token: String,
    /// Always "Bearer".
    pub token_type: String,
}

impl AuthBody {
    /// Wraps a signed token.
    ///
    /// ```rust
    /// use coach_auth::auth_body::AuthBody;
    ///
    /// let body = AuthBody::new("signed.jwt.value".to_string());
    /// assert_eq!(body.token_type, "Bearer");
    /// ```
    pub fn new(access_token: String) -> Self {
        Self {
            access_token,
            token_type: String::from(CONNECTION_TOKEN_TYPE),
        }
    }
}
