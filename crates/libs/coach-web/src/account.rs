//! Account payloads and provisioning.

use chrono::{DateTime, Utc};
use coach_auth::secret_hash::generate_secret_hash;
use coach_models::{
    account::{
        coach_user::{CoachUser, CoachUserCreate},
        role::Role,
    },
    db::connection::DbConnection,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::prelude::*;

/// `username` may also hold the account's email address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub role: Role,
    pub coach_id: Option<String>,
    pub username: String,
}

/// An account as shown to operators. Never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountApi {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: String,
    pub coach_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<CoachUser> for W<AccountApi> {
    fn from(value: CoachUser) -> Self {
        Self(AccountApi {
            id: value.id,
            username: value.username,
            email: value.email,
            role: value.role,
            coach_id: value.coach_id,
            created_at: value.created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountPost {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Role,
    #[serde(default)]
    pub coach_id: Option<String>,
}

impl AccountPost {
    /// Trimmed fields. QA accounts never keep a coach id; a blank one is dropped.
    fn normalised(self) -> Result<Self> {
        let username = self.username.trim().to_string();
        let email = self.email.trim().to_string();
        if username.is_empty() || email.is_empty() || self.password.is_empty() {
            return Err(Error::BadRequest(String::from(
                "username, email and password are required",
            )));
        }
        let coach_id = match self.role {
            Role::Qa => None,
            Role::Coach => self
                .coach_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        };
        Ok(Self {
            username,
            email,
            password: self.password,
            role: self.role,
            coach_id,
        })
    }
}

/// Creates the account, or updates the one with the same username.
///
/// Returns the stored account and whether it was created.
pub fn upsert_account(payload: AccountPost, connection: &DbConnection) -> Result<(AccountApi, bool)> {
    let payload = payload.normalised()?;
    let hash = generate_secret_hash(&payload.password)?;
    let model = CoachUserCreate {
        username: payload.username,
        email: payload.email,
        hash,
        role: payload.role.to_string(),
        coach_id: payload.coach_id,
    };
    let (user, created) = model.upsert(connection)?;
    info!(
        "{} {} account '{}'",
        if created { "Created" } else { "Updated" },
        user.role,
        user.username
    );
    let W(account) = W::<AccountApi>::from(user);
    Ok((account, created))
}
