use coach_models::{
    account::{coach_user::CoachUser, role::Role},
    coach::coach_data::CoachData,
    db::connection::DbConnection,
};
use coach_web::account::{AccountApi, AccountPost, upsert_account};
use coach_web::prelude::W;

use crate::cli::AccountArgs;
use crate::error::Result;

pub fn handle_create_account(db: &DbConnection, args: AccountArgs) -> Result<()> {
    let password = match args.password {
        Some(password) => password,
        None => rpassword::prompt_password("Password > ")?,
    };
    let payload = AccountPost {
        username: args.username,
        email: args.email,
        password,
        role: args.role,
        coach_id: args.coach_id,
    };

    let (account, created) = upsert_account(payload, db)?;
    if created {
        println!("Created {} account '{}'", account.role, account.username);
    } else {
        println!("Updated {} account '{}'", account.role, account.username);
    }
    println!("{}", serde_json::to_string_pretty(&account)?);
    Ok(())
}

/// One aligned line per account.
pub fn account_line(account: &AccountApi) -> String {
    format!(
        "{:<24} {:<32} {:<6} {}",
        account.username,
        account.email,
        account.role,
        account.coach_id.as_deref().unwrap_or("-")
    )
}

pub fn handle_list_accounts(db: &DbConnection, role: Option<Role>) -> Result<()> {
    let users = match role {
        Some(role) => CoachUser::fetch_by_role(role, db)?,
        None => CoachUser::fetch_all(db)?,
    };
    println!("{:<24} {:<32} {:<6} COACH ID", "USERNAME", "EMAIL", "ROLE");
    for user in users {
        let W(account) = W::<AccountApi>::from(user);
        println!("{}", account_line(&account));
    }
    Ok(())
}

/// Counts from one seeding pass.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
}

/// The case owner id a coach account's tasks live under, if it has a usable one.
pub fn case_owner_id(user: &CoachUser) -> Option<i32> {
    user.coach_id.as_deref()?.trim().parse().ok()
}

pub fn handle_seed_coach_data(db: &DbConnection) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    for user in CoachUser::fetch_by_role(Role::Coach, db)? {
        let Some(owner) = case_owner_id(&user) else {
            log::warn!("Skipping '{}': no numeric coach id", user.username);
            summary.skipped += 1;
            continue;
        };
        if CoachData::ensure(owner, db)? {
            log::info!("Created task list {owner} for '{}'", user.username);
            summary.created += 1;
        } else {
            summary.existing += 1;
        }
    }
    println!(
        "created: {}, existing: {}, skipped: {}",
        summary.created, summary.existing, summary.skipped
    );
    Ok(summary)
}
