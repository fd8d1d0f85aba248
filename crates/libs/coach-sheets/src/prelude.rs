//! Common types and utilities.

pub use crate::error::{Error, GatewayError};

pub type Result<T> = core::result::Result<T, Error>;
