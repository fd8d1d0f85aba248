//! Database models for coachdesk.
//!
//! Diesel/Postgres models for the two tables the server owns: staff accounts
//! (`coach_user`) and the per-coach JSON task list (`coaches_data`).
//!
//! ```rust,no_run
//! use coach_models::{account::coach_user::CoachUser, db::{config::DbConfig, connection::DbConnection}};
//!
//! let db = DbConnection::new(&DbConfig::from_env()).setup();
//! let accounts = CoachUser::fetch_all(&db).unwrap();
//! println!("{} accounts", accounts.len());
//! ```

pub mod account;
pub mod coach;
pub mod db;
pub mod error;
pub mod prelude;
mod schema;
