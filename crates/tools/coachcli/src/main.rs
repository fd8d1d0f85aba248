mod cli;
mod commands;
mod error;

use clap::Parser;
use cli::{Cli, Commands};
use coach_models::db::{config::DbConfig, connection::DbConnection};
use commands::{handle_create_account, handle_list_accounts, handle_seed_coach_data};
use error::Result;

fn main() -> Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    let db = DbConnection::new(&DbConfig::from_env()).setup();

    let result = match cli.command {
        Commands::CreateAccount(args) => handle_create_account(&db, args),
        Commands::ListAccounts { role } => handle_list_accounts(&db, role),
        Commands::SeedCoachData => handle_seed_coach_data(&db).map(|_| ()),
    };

    if let Err(ref e) = result {
        log::error!("Error: {}", e);
    }

    result
}
