//! The authenticated account behind a request.

use std::collections::HashSet;

use chrono::TimeDelta;
use coach_auth::auth_body::AuthBody;
use coach_models::account::{coach_user::CoachUser, role::Role};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth_token::{AuthToken, encode_token};
use crate::ctx::{PERM_EVIDENCE, PERM_TASKS, PERM_TASKS_ALL};
use crate::prelude::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CtxUser {
    pub id: Uuid,
    pub username: String,
}

const USER_TOKEN_EXPIRATION_TIME: TimeDelta = TimeDelta::hours(12);
const COACH_PERMISSIONS: [&str; 2] = [PERM_TASKS, PERM_EVIDENCE];
const QA_PERMISSIONS: [&str; 3] = [PERM_TASKS, PERM_TASKS_ALL, PERM_EVIDENCE];

/// Permissions granted to every account with `role`.
pub fn permissions_for(role: Role) -> HashSet<String> {
    let granted: &[&str] = match role {
        Role::Coach => &COACH_PERMISSIONS,
        Role::Qa => &QA_PERMISSIONS,
    };
    granted.iter().map(|p| String::from(*p)).collect()
}

/// Signs a session token for `user`.
pub fn generate_token(user: &CoachUser, role: Role) -> Result<AuthBody> {
    let claims = AuthToken::new_user(user, role, permissions_for(role), USER_TOKEN_EXPIRATION_TIME)?;
    encode_token(&claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qa_reaches_every_task_list() {
        let qa = permissions_for(Role::Qa);
        let coach = permissions_for(Role::Coach);
        assert!(qa.contains(PERM_TASKS_ALL));
        assert!(!coach.contains(PERM_TASKS_ALL));
        assert!(coach.contains(PERM_TASKS) && coach.contains(PERM_EVIDENCE));
        assert_eq!(qa.len(), 3);
    }
}
