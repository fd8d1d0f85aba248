use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// What an account is allowed to see.
///
/// A coach only sees their own task list; a QA reviewer sees every coach's.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coach,
    Qa,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coach => "coach",
            Role::Qa => "qa",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "coach" => Ok(Role::Coach),
            "qa" => Ok(Role::Qa),
            _ => Err(Error::UnknownRole(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_stored_values() {
        assert_eq!("coach".parse::<Role>().unwrap(), Role::Coach);
        assert_eq!(" QA ".parse::<Role>().unwrap(), Role::Qa);
        assert!(matches!(
            "admin".parse::<Role>(),
            Err(Error::UnknownRole(role)) if role == "admin"
        ));
    }

    #[test]
    fn display_matches_column_value() {
        assert_eq!(Role::Qa.to_string(), "qa");
        assert_eq!(Role::Coach.to_string(), "coach");
    }
}
