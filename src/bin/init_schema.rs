use std::env;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use nubo_schema::{config::AppConfig, db, InitOptions, SchemaInitializer};

const USAGE: &str = "Usage: init_schema [apply|verify] [--no-seed]";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Apply,
    Verify,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let (command, seed_override) = parse_args(env::args().skip(1))?;

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "init_schema",
        database_url = %config.redacted_database_url(),
        database = %config.database_name,
        collection_suffix = %config.collection_suffix,
        seed_placeholders = seed_override.unwrap_or(config.seed_placeholders),
        "loaded schema configuration"
    );

    let database = db::connect(&config).await?;
    let initializer = SchemaInitializer::new(
        database,
        InitOptions {
            collection_suffix: config.collection_suffix.clone(),
            seed_placeholders: seed_override.unwrap_or(config.seed_placeholders),
        },
    );

    match command {
        Command::Apply => {
            let report = initializer.apply().await?;
            tracing::info!(
                collections_created = report.created_collections(),
                indexes_created = report.created_indexes(),
                "schema applied"
            );
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Verify => {
            let drift = initializer.verify().await?;
            println!("{}", serde_json::to_string_pretty(&drift)?);
            if !drift.is_empty() {
                bail!("schema drift detected: {} issue(s)", drift.len());
            }
            tracing::info!("schema matches declaration");
        }
    }

    Ok(())
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<(Command, Option<bool>)> {
    let mut command = Command::Apply;
    let mut seed_override = None;
    for arg in args {
        match arg.as_str() {
            "apply" => command = Command::Apply,
            "verify" => command = Command::Verify,
            "--no-seed" => seed_override = Some(false),
            other => bail!("unknown argument: {other}\n{USAGE}"),
        }
    }
    Ok((command, seed_override))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
