//! Signing and validation of the bearer tokens used by coachdesk.
//!
//! Tokens are HS256-signed with the secret in the `JWT_SECRET` environment
//! variable. The keys are built on first use and shared by every request.
//!
//! ```rust
//! use coach_auth::jwt::{jwt_decode, jwt_encode};
//! use serde::{Deserialize, Serialize};
//! unsafe { std::env::set_var("JWT_SECRET", "coachdesk-doc-secret"); }
//!
//! #[derive(Debug, PartialEq, Eq, Serialize, Deserialize)]
//! struct ReviewerClaims {
//!     reviewer: String,
//!     exp: usize,
//! }
//!
//! let claims = ReviewerClaims {
//!     reviewer: "qa.reviewer".to_string(),
//!     exp: 4118335200,
//! };
//! let token = jwt_encode(&claims).unwrap();
//! assert_eq!(jwt_decode::<ReviewerClaims>(&token).unwrap().claims, claims);
//! ```

use crate::prelude::*;
use std::sync::LazyLock;

use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, TokenData, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Serialize, de::DeserializeOwned};

static KEYS: LazyLock<Keys> = LazyLock::new(|| {
    let secret = std::env::var("JWT_SECRET").expect("JWT_SECRET must be set");
    Keys::new(secret.as_bytes())
});

const ALGORITHM: Algorithm = Algorithm::HS256;

struct Keys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl Keys {
    fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Signs `body` into a compact JWT.
///
/// The claims are signed, not encrypted: keep them to identity and role data.
pub fn jwt_encode<T>(body: &T) -> Result<String>
where
    T: Serialize,
{
    let header = Header::new(ALGORITHM);
    Ok(encode(&header, body, &KEYS.encoding)?)
}

/// Verifies the signature of `token` and deserializes its claims.
///
/// An expired token is [`Error::TokenExpired`]; any other failure is
/// [`Error::InvalidToken`].
pub fn jwt_decode<T>(token: &str) -> Result<TokenData<T>>
where
    T: DeserializeOwned,
{
    decode(token, &KEYS.decoding, &Validation::new(ALGORITHM)).map_err(|err| match err.kind() {
        ErrorKind::ExpiredSignature => Error::TokenExpired,
        _ => Error::InvalidToken,
    })
}
