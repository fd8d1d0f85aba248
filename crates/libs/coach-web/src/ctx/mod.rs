//! Request context for authenticated handlers.

use std::collections::HashSet;

use coach_models::account::role::Role;

use crate::ctx::ctx_user::CtxUser;

pub mod ctx_user;
pub mod resolver;

/// Permission to read and edit task lists.
pub const PERM_TASKS: &str = "tasks";
/// Permission to read and edit every coach's task list, not only one's own.
pub const PERM_TASKS_ALL: &str = "tasks.all";
/// Permission to look up students and submit evidence for marking.
pub const PERM_EVIDENCE: &str = "evidence";

/// Who is calling and what they may do.
#[derive(Clone, Debug)]
pub struct Ctx {
    pub user: CtxUser,
    pub role: Role,
    /// The caller's own task list, for coaches.
    pub coach_id: Option<String>,
    pub permissions: HashSet<String>,
}

impl Ctx {
    /// Creates a request context.
    ///
    /// ```rust
    /// use coach_models::account::role::Role;
    /// use coach_web::ctx::{Ctx, PERM_TASKS, ctx_user::{CtxUser, permissions_for}};
    /// use uuid::Uuid;
    ///
    /// let user = CtxUser { id: Uuid::new_v4(), username: "omar".to_string() };
    /// let ctx = Ctx::new(user, Role::Coach, Some("17".to_string()), permissions_for(Role::Coach));
    /// assert!(ctx.permissions.contains(PERM_TASKS));
    /// assert!(ctx.can_access_coach("17"));
    /// assert!(!ctx.can_access_coach("18"));
    /// ```
    pub fn new(
        user: CtxUser,
        role: Role,
        coach_id: Option<String>,
        permissions: HashSet<String>,
    ) -> Self {
        Self {
            user,
            role,
            coach_id,
            permissions,
        }
    }

    /// `tasks.all` reaches any coach; otherwise only the caller's own list.
    pub fn can_access_coach(&self, coach_id: &str) -> bool {
        self.permissions.contains(PERM_TASKS_ALL) || self.coach_id.as_deref() == Some(coach_id)
    }
}
