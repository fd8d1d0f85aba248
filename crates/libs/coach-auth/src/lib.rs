//! Authentication primitives shared by the coachdesk server and tools.
//!
//! - [`jwt`]: signing and validating the bearer tokens handed to coaches and QA reviewers
//! - [`secret_hash`]: argon2 password hashing for stored accounts
//! - [`auth_body`]: the token payload returned on login

pub mod auth_body;
pub mod error;
pub mod jwt;
pub mod prelude;
pub mod secret_hash;

pub const CONNECTION_TOKEN_TYPE: &str = "Bearer";
pub const ISS: &str = "COACHDESK";

/// Header carrying the bearer credential when no cookie is present.
pub const AUTH_HEADER: &str = "Authorization";
pub const AUTH_HEADER_PREFIX: &str = "Bearer ";
