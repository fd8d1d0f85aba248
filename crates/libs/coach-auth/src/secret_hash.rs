//! Argon2 hashing of account passwords.
//!
//! ```rust
//! use coach_auth::secret_hash::{generate_secret_hash, is_secret_valid};
//!
//! let hash = generate_secret_hash("coach-password").unwrap();
//! assert!(is_secret_valid("coach-password", &hash).unwrap());
//! assert!(!is_secret_valid("another-password", &hash).unwrap());
//! ```

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{self, PasswordHashString, SaltString},
};
use rand::rngs::OsRng;

use crate::prelude::*;

/// Hashes `pw` with a fresh random salt. The PHC string embeds salt and parameters.
pub fn generate_secret_hash(pw: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    Ok(argon2.hash_password(pw.as_bytes(), &salt)?.to_string())
}

/// Checks `pw` against a stored PHC hash string.
///
/// A malformed `hash` is an error; a wrong password is `Ok(false)`.
pub fn is_secret_valid(pw: &str, hash: &str) -> Result<bool> {
    let hash = PasswordHashString::new(hash)?;

    Ok(Argon2::default()
        .verify_password(pw.as_bytes(), &hash.password_hash())
        .is_ok())
}

impl From<password_hash::Error> for Error {
    fn from(value: password_hash::Error) -> Self {
        Self::PasswordHash(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_hash_is_an_error() {
        assert!(is_secret_valid("pw", "not-a-phc-string").is_err());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = generate_secret_hash("123456789").unwrap();
        let b = generate_secret_hash("123456789").unwrap();
        assert_ne!(a, b);
        assert!(is_secret_valid("123456789", &a).unwrap());
        assert!(is_secret_valid("123456789", &b).unwrap());
    }
}
