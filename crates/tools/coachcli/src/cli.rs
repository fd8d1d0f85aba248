//! Command-line interface definitions for coachcli.

use clap::{Args, Parser, Subcommand};
use coach_models::account::role::Role;

/// Setup tool for a coachdesk database.
///
/// Every command connects with `DATABASE_URL`.
#[derive(Parser)]
#[command(name = "coachcli")]
#[command(about = "coachdesk CLI - account and task-list setup")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account, or reset the password and details of an existing one
    CreateAccount(AccountArgs),

    /// Print accounts as JSON
    ListAccounts {
        /// Only accounts with this role (coach or qa)
        #[arg(long)]
        role: Option<Role>,
    },

    /// Create an empty task list for every coach account with a numeric coach id
    SeedCoachData,
}

#[derive(Args)]
pub struct AccountArgs {
    #[arg(long)]
    pub username: String,

    #[arg(long)]
    pub email: String,

    /// coach or qa
    #[arg(long, default_value = "coach")]
    pub role: Role,

    /// Case owner id the coach's tasks are stored under
    #[arg(long)]
    pub coach_id: Option<String>,

    /// Account password
    /// Recomended to keep this empty and set it when prompted
    #[arg(long)]
    pub password: Option<String>,
}
