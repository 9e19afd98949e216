//! Folio CLI - sync articles and categories from the command line
//!
//! Local records are read from a JSON file, synced through the Folio sync
//! service, and incoming remote records are written back to the same file.

mod auth;
mod cli;
mod commands;
mod config_profiles;
mod error;

use clap::Parser;

use crate::cli::{Cli, Commands};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let mut filter = tracing_subscriber::EnvFilter::from_default_env();
    if let Ok(directive) = "folio=info".parse() {
        filter = filter.add_directive(directive);
    }
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();
    let profile = cli.profile.as_deref();

    match cli.command {
        Commands::Sync(args) => commands::sync::run_sync(args, profile).await,
        Commands::Resolve(args) => commands::resolve::run_resolve(args, profile).await,
        Commands::Device => commands::device::run_device(profile),
        Commands::Status { json } => commands::status::run_status(json, profile),
        Commands::Config { command } => commands::config::run_config(command, profile),
        Commands::Auth { command } => commands::auth_cmd::run_auth(command, profile),
    }
}

#[cfg(test)]
mod tests;
