//! Session tokens and credential checks.

use std::collections::HashSet;

use crate::prelude::*;
use chrono::{TimeDelta, Utc};
use coach_auth::{
    ISS,
    auth_body::AuthBody,
    jwt::{jwt_decode, jwt_encode},
    secret_hash::is_secret_valid,
};
use coach_models::{
    account::{coach_user::CoachUser, role::Role},
    db::connection::DbConnection,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use crate::account::LoginRequest;

/// JWT claims for a logged-in coach or QA reviewer.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthToken {
    /// Account id.
    pub sub: Uuid,
    pub iss: String,
    pub exp: i64,
    pub iat: i64,
    pub nbf: i64,
    pub jti: Uuid,
    pub permissions: HashSet<String>,
    pub username: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coach_id: Option<String>,
}

impl AuthToken {
    /// Claims for `user`, valid for `token_duration` from now.
    pub fn new_user(
        user: &CoachUser,
        role: Role,
        permissions: HashSet<String>,
        token_duration: TimeDelta,
    ) -> Result<Self> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(token_duration)
            .ok_or(Error::AuthTokenCreation)?;

        Ok(Self {
            sub: user.id,
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            iss: String::from(ISS),
            jti: Uuid::new_v4(),
            permissions,
            username: user.username.clone(),
            role,
            coach_id: user.coach_id.clone(),
        })
    }
}

fn verified(candidate: Option<CoachUser>, password: &str) -> Result<Option<CoachUser>> {
    match candidate {
        Some(user) if is_secret_valid(password, &user.hash)? => Ok(Some(user)),
        _ => Ok(None),
    }
}

/// Checks a login against stored accounts.
///
/// The login name is tried as a username first, then as an email address.
/// An account whose role is not `coach` or `qa` is refused even with the
/// right password.
pub fn authenticate(auth: &LoginRequest, connection: &DbConnection) -> Result<(CoachUser, Role)> {
    let login = auth.username.trim();
    if login.is_empty() || auth.password.is_empty() {
        return Err(Error::MissingCredentials);
    }

    let user = match verified(CoachUser::find_by_username(login, connection)?, &auth.password)? {
        Some(user) => user,
        None => {
            debug!("No password match for username '{login}', trying it as an email");
            verified(CoachUser::find_by_email(login, connection)?, &auth.password)?
                .ok_or(Error::WrongCredentials)?
        }
    };

    let role = user.role().map_err(|_| Error::InvalidRole)?;
    Ok((user, role))
}

pub fn encode_token(token: &AuthToken) -> Result<AuthBody> {
    let token = jwt_encode(&token).map_err(|err| {
        error!("Failed to encode JWT {err}");
        err
    })?;

    Ok(AuthBody::new(token))
}

pub fn decode_token(token: &str) -> Result<AuthToken> {
    Ok(jwt_decode::<AuthToken>(token)
        .map_err(|err| {
            log::error!("Failed to decode jwt token {err}");
            err
        })?
        .claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(coach_id: Option<&str>) -> CoachUser {
        CoachUser {
            id: Uuid::new_v4(),
            username: String::from("omar"),
            email: String::from("omar@coachdesk.test"),
            hash: String::new(),
            role: String::from("coach"),
            coach_id: coach_id.map(String::from),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    #[serial_test::serial]
    fn token_roundtrip_keeps_scope() {
        unsafe { std::env::set_var("JWT_SECRET", "coach-web-test-secret") };
        let account = user(Some("17"));
        let claims = AuthToken::new_user(
            &account,
            Role::Coach,
            crate::ctx::ctx_user::permissions_for(Role::Coach),
            TimeDelta::hours(1),
        )
        .unwrap();
        let encoded = encode_token(&claims).unwrap();
        assert_eq!(encoded.token_type, "Bearer");

        let decoded = decode_token(&encoded.access_token).unwrap();
        assert_eq!(decoded.sub, account.id);
        assert_eq!(decoded.role, Role::Coach);
        assert_eq!(decoded.coach_id.as_deref(), Some("17"));
        assert_eq!(decoded.username, "omar");
        assert_eq!(decoded.iss, ISS);
        assert!(decoded.exp > decoded.iat);
    }

    #[test]
    fn qa_claims_omit_coach_id() {
        let claims = AuthToken::new_user(
            &user(None),
            Role::Qa,
            HashSet::new(),
            TimeDelta::hours(1),
        )
        .unwrap();
        let json = serde_json::to_value(&claims).unwrap();
        assert!(json.get("coach_id").is_none());
        assert_eq!(json["role"], "qa");
    }
}
