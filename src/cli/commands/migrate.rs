use anyhow::Context;

use crate::cli::{connect, utils::output_success, OutputFormat};
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let pool = connect().await?;
    DatabaseManager::migrate(&pool)
        .await
        .context("failed to apply migrations")?;
    output_success(output_format, "Migrations applied", None)
}
