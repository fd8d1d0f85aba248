//! Staff accounts: coaches and QA reviewers.

pub mod coach_user;
pub mod role;
