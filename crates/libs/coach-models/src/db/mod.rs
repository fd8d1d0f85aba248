//! Connection pool and configuration.

pub mod config;
pub mod connection;
