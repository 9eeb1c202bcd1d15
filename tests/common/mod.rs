use std::env;
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use mongodb::bson::{Document, Uuid as BsonUuid};
use mongodb::{Collection, Database};
use nubo_schema::{db, InitOptions, SchemaInitializer};
use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use uuid::Uuid;

static DB_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

/// A throwaway database on the server named by `TEST_MONGO_URI`.
pub struct TestDb {
    pub database: Database,
}

impl TestDb {
    pub async fn new() -> Result<Self> {
        let database_url = env::var("TEST_MONGO_URI")
            .context("TEST_MONGO_URI must be set for integration tests")?;

        let client = db::connect_client(&database_url, Duration::from_secs(5))
            .await
            .context("failed to connect to TEST_MONGO_URI")?;
        let name = format!("nubo_schema_test_{}", Uuid::new_v4().simple());
        Ok(Self {
            database: client.database(&name),
        })
    }

    pub fn initializer(&self) -> SchemaInitializer {
        self.initializer_with(InitOptions::default())
    }

    #[allow(dead_code)]
    pub fn initializer_with(&self, options: InitOptions) -> SchemaInitializer {
        SchemaInitializer::new(self.database.clone(), options)
    }

    pub fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection(name)
    }

    #[allow(dead_code)]
    pub async fn index_names(&self, collection: &str) -> Result<Vec<String>> {
        let mut names: Vec<String> = self
            .collection(collection)
            .list_indexes(None)
            .await?
            .try_collect::<Vec<_>>()
            .await?
            .into_iter()
            .filter_map(|model| model.options.and_then(|options| options.name))
            .collect();
        names.sort();
        Ok(names)
    }

    #[allow(dead_code)]
    pub async fn collection_names(&self) -> Result<Vec<String>> {
        let mut names = self.database.list_collection_names(None).await?;
        names.sort();
        Ok(names)
    }

    pub async fn cleanup(&self) -> Result<()> {
        self.database
            .drop(None)
            .await
            .context("failed to drop test database")?;
        Ok(())
    }
}

pub async fn acquire_db_lock() -> tokio::sync::MutexGuard<'static, ()> {
    DB_LOCK.lock().await
}

#[allow(dead_code)]
pub fn new_id() -> BsonUuid {
    BsonUuid::from_bytes(Uuid::new_v4().into_bytes())
}
