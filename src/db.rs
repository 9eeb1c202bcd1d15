use std::time::Duration;

use mongodb::bson::doc;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};

use crate::config::AppConfig;
use crate::error::{SchemaError, SchemaResult};

pub const APP_NAME: &str = "nubo-schema";

pub async fn connect(config: &AppConfig) -> SchemaResult<Database> {
    let client = connect_client(&config.database_url, config.connect_timeout).await?;
    Ok(client.database(&config.database_name))
}

/// Builds a client and pings the server; any failure here is a `ConnectionFailure`.
pub async fn connect_client(database_url: &str, timeout: Duration) -> SchemaResult<Client> {
    let mut options = ClientOptions::parse(database_url)
        .await
        .map_err(SchemaError::ConnectionFailure)?;
    options.app_name = Some(APP_NAME.to_string());
    options.connect_timeout = Some(timeout);
    options.server_selection_timeout = Some(timeout);

    let client = Client::with_options(options).map_err(SchemaError::ConnectionFailure)?;
    client
        .database("admin")
        .run_command(doc! { "ping": 1 }, None)
        .await
        .map_err(SchemaError::ConnectionFailure)?;
    Ok(client)
}
