use std::env;

use anyhow::{bail, Context, Result};
use tracing_subscriber::EnvFilter;

use nubo_schema::{config::AppConfig, db, maintenance};

const USAGE: &str = "Usage: maintenance <remove-placeholders | prune-stale [DAYS]>";

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    match parse_args(env::args().skip(1))? {
        Command::RemovePlaceholders => remove_placeholders().await,
        Command::PruneStale(days) => prune_stale(days).await,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command {
    RemovePlaceholders,
    PruneStale(Option<i64>),
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Command> {
    let mut args = args.into_iter();
    match args.next().as_deref() {
        Some("remove-placeholders") => Ok(Command::RemovePlaceholders),
        Some("prune-stale") => {
            let days = args
                .next()
                .map(|value| value.parse::<i64>())
                .transpose()
                .context("DAYS must be an integer")?;
            Ok(Command::PruneStale(days))
        }
        Some(cmd) => bail!("unknown command: {cmd}\n{USAGE}"),
        None => bail!("missing command\n{USAGE}"),
    }
}

async fn load() -> Result<(AppConfig, mongodb::Database)> {
    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "maintenance",
        database_url = %config.redacted_database_url(),
        database = %config.database_name,
        collection_suffix = %config.collection_suffix,
        "loaded schema configuration"
    );
    let database = db::connect(&config).await?;
    Ok((config, database))
}

async fn remove_placeholders() -> Result<()> {
    let (config, database) = load().await?;
    let removed = maintenance::remove_placeholders(&database, &config.collection_suffix).await?;
    println!("Removed {removed} placeholder documents.");
    Ok(())
}

async fn prune_stale(days: Option<i64>) -> Result<()> {
    let (config, database) = load().await?;
    let days = days.unwrap_or(config.stale_after_days);
    let report = maintenance::prune_stale(&database, &config.collection_suffix, days).await?;
    println!(
        "Deleted {} documents unused for {days} days.",
        report.deleted
    );
    if !report.failed_collections.is_empty() {
        bail!("failed to prune: {}", report.failed_collections.join(", "));
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
