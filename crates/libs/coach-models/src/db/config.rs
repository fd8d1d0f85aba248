//! Database configuration.

use std::fmt::Display;

/// Where to find the Postgres database.
pub struct DbConfig {
    pub database_url: String,
}

fn get_env_variable(var: &str) -> String {
    std::env::var(var).unwrap_or_else(|_| panic!("Env Variable '{var}' missing"))
}

impl DbConfig {
    /// Reads `DATABASE_URL`. Panics when it is unset: the server cannot start without it.
    pub fn from_env() -> Self {
        Self {
            database_url: get_env_variable("DATABASE_URL"),
        }
    }
}

impl Display for DbConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "REDACTED")
    }
}
