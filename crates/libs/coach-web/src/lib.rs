//! Web layer for the coachdesk server.
//!
//! Request context and auth middleware, the login flow, the per-coach task
//! list, evidence upload storage and the response shapes of the evidence
//! endpoints. Handlers themselves live in the `coachd` binary.

pub mod account;
pub mod auth_token;
pub mod ctx;
pub mod error;
pub mod evidence;
pub mod mw_auth;
pub mod prelude;
pub mod tasks;
pub mod upload;
