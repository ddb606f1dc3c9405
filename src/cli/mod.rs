pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::config::config;
use crate::database::DatabaseManager;

#[derive(Parser)]
#[command(name = "handbok-admin")]
#[command(about = "Handbok admin CLI - migrations, data copies and role grants")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Apply pending SQL migrations")]
    Migrate,

    #[command(about = "Copy every application table from one schema to another")]
    CopyData(commands::copy_data::CopyDataArgs),

    #[command(about = "Give a user a role in an organization")]
    GrantRole(commands::grant_role::GrantRoleArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Migrate => commands::migrate::handle(output_format).await,
        Commands::CopyData(args) => commands::copy_data::handle(args, output_format).await,
        Commands::GrantRole(args) => commands::grant_role::handle(args, output_format).await,
    }
}

/// Pool from `DATABASE_URL`; fails fast instead of waiting for the first query.
pub(crate) async fn connect() -> anyhow::Result<PgPool> {
    use anyhow::Context;

    let pool = DatabaseManager::connect_lazy(&config().database).context("invalid database configuration")?;
    DatabaseManager::health_check(&pool)
        .await
        .context("could not reach the database")?;
    Ok(pool)
}
