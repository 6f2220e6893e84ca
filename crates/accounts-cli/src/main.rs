mod cli;
mod commands;
mod config;
mod observability;
mod output;

use accounts_mongo::MongoPasswordStorage;
use anyhow::{Context, Result};
use clap::Parser;

use cli::{Cli, Commands};
use output::print_error;

#[tokio::main]
async fn main() {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    if let Err(e) = run().await {
        print_error(&format!("{e:#}"));
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    observability::init_tracing_with_level(&cli.log_level);
    let format = cli.format.unwrap_or_default();

    let cfg = config::resolve(
        cli.config.as_deref(),
        cli.uri.as_deref(),
        cli.database.as_deref(),
    )?;
    tracing::debug!(database = %cfg.database, collection = %cfg.options.collection_name, "Resolved configuration");

    let storage = MongoPasswordStorage::connect(&cfg.uri, &cfg.database, cfg.options)
        .await
        .context("Failed to open MongoDB storage")?;

    match &cli.command {
        Commands::SetupIndexes => commands::setup_indexes(&storage).await?,
        Commands::FindByResetToken(args) => {
            commands::find_by_reset_token(&storage, args, format).await?
        }
        Commands::FindByVerificationToken(args) => {
            commands::find_by_verification_token(&storage, args, format).await?
        }
        Commands::Show(args) => commands::show(&storage, args, format).await?,
        Commands::HasPassword(args) => commands::has_password(&storage, args).await?,
        Commands::AddEmail(args) => commands::add_email(&storage, args).await?,
        Commands::RemoveEmail(args) => commands::remove_email(&storage, args).await?,
        Commands::VerifyEmail(args) => commands::verify_email(&storage, args).await?,
    }

    Ok(())
}
