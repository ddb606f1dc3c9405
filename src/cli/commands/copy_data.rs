use anyhow::{bail, Context};
use clap::Args;
use serde_json::json;
use sqlx::PgPool;

use crate::cli::{connect, utils::output_counts, utils::output_success, OutputFormat};
use crate::database::DatabaseManager;

/// Application tables, parents before children
pub const TABLES: &[&str] = &[
    "organizations",
    "users",
    "user_organizations",
    "handbooks",
    "sections",
    "pages",
    "documents",
    "subscriptions",
];

#[derive(Args, Debug)]
pub struct CopyDataArgs {
    #[arg(long, help = "Source schema")]
    pub from: String,

    #[arg(long, help = "Target schema")]
    pub to: String,

    #[arg(long, help = "Empty the target tables first")]
    pub truncate: bool,

    #[arg(long, help = "Only report source row counts")]
    pub dry_run: bool,
}

/// Statements for one copy, in execution order.
pub fn copy_statements(from: &str, to: &str, truncate: bool) -> anyhow::Result<Vec<String>> {
    for schema in [from, to] {
        if !DatabaseManager::is_valid_schema_name(schema) {
            bail!("invalid schema name '{}'", schema);
        }
    }
    if from == to {
        bail!("source and target schema are both '{}'", from);
    }

    let source = DatabaseManager::quote_identifier(from);
    let target = DatabaseManager::quote_identifier(to);
    let mut statements = Vec::with_capacity(TABLES.len() + 1);

    if truncate {
        // One statement: Postgres refuses to truncate a referenced table on its own
        let tables: Vec<String> = TABLES
            .iter()
            .rev()
            .map(|t| format!("{}.{}", target, DatabaseManager::quote_identifier(t)))
            .collect();
        statements.push(format!("TRUNCATE {}", tables.join(", ")));
    }

    for table in TABLES {
        let table = DatabaseManager::quote_identifier(table);
        statements.push(format!(
            "INSERT INTO {target}.{table} SELECT * FROM {source}.{table}"
        ));
    }
    Ok(statements)
}

pub async fn handle(args: CopyDataArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let statements = copy_statements(&args.from, &args.to, args.truncate)?;
    let pool = connect().await?;

    for schema in [&args.from, &args.to] {
        ensure_schema(&pool, schema).await?;
    }

    if args.dry_run {
        let counts = source_counts(&pool, &args.from).await?;
        output_success(
            output_format,
            &format!("Dry run: would copy {} → {}", args.from, args.to),
            Some(json!({ "dry_run": true, "tables": counts_json(&counts) })),
        )?;
        output_counts(output_format, &counts);
        return Ok(());
    }

    let mut tx = pool.begin().await?;
    let mut copied = Vec::with_capacity(TABLES.len());
    let inserts = statements.iter().skip(usize::from(args.truncate));

    if args.truncate {
        sqlx::query(&statements[0])
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to truncate {}", args.to))?;
        tracing::info!("Truncated application tables in {}", args.to);
    }

    for (table, sql) in TABLES.iter().zip(inserts) {
        let result = sqlx::query(sql)
            .execute(&mut *tx)
            .await
            .with_context(|| format!("failed to copy {}", table))?;
        tracing::info!("Copied {} rows into {}.{}", result.rows_affected(), args.to, table);
        copied.push((table.to_string(), result.rows_affected() as i64));
    }

    tx.commit().await.context("failed to commit copy")?;

    output_success(
        output_format,
        &format!("Copied {} → {}", args.from, args.to),
        Some(json!({ "dry_run": false, "tables": counts_json(&copied) })),
    )?;
    output_counts(output_format, &copied);
    Ok(())
}

async fn ensure_schema(pool: &PgPool, schema: &str) -> anyhow::Result<()> {
    let (exists,): (bool,) =
        sqlx::query_as("SELECT EXISTS (SELECT 1 FROM information_schema.schemata WHERE schema_name = $1)")
            .bind(schema)
            .fetch_one(pool)
            .await?;
    if !exists {
        bail!("schema '{}' does not exist", schema);
    }
    Ok(())
}

async fn source_counts(pool: &PgPool, schema: &str) -> anyhow::Result<Vec<(String, i64)>> {
    let source = DatabaseManager::quote_identifier(schema);
    let mut counts = Vec::with_capacity(TABLES.len());
    for table in TABLES {
        let sql = format!("SELECT COUNT(*) FROM {}.{}", source, DatabaseManager::quote_identifier(table));
        let (count,): (i64,) = sqlx::query_as(&sql)
            .fetch_one(pool)
            .await
            .with_context(|| format!("failed to count {}.{}", schema, table))?;
        counts.push((table.to_string(), count));
    }
    Ok(counts)
}

fn counts_json(counts: &[(String, i64)]) -> serde_json::Value {
    counts
        .iter()
        .map(|(table, count)| (table.clone(), json!(count)))
        .collect::<serde_json::Map<_, _>>()
        .into()
}
