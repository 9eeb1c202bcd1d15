use futures_util::TryStreamExt;
use mongodb::bson::{doc, DateTime, Document};
use mongodb::error::Error as MongoError;
use mongodb::options::CountOptions;
use mongodb::{Collection, Database, IndexModel};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{
    is_duplicate_key, is_index_conflict, is_namespace_exists, SchemaError, SchemaResult,
};
use crate::schema::{CollectionSpec, IndexSpec, COLLECTIONS};

#[derive(Debug, Clone)]
pub struct InitOptions {
    pub collection_suffix: String,
    pub seed_placeholders: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            collection_suffix: String::new(),
            seed_placeholders: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionOutcome {
    Created,
    AlreadyExists,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedOutcome {
    Inserted,
    SkippedNonEmpty,
    AlreadySeeded,
    Disabled,
}

#[derive(Debug, Clone, Serialize)]
pub struct CollectionReport {
    pub collection: String,
    pub outcome: CollectionOutcome,
    pub indexes_created: Vec<String>,
    pub indexes_present: Vec<String>,
    pub seed: SeedOutcome,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    pub collections: Vec<CollectionReport>,
}

impl InitReport {
    pub fn created_collections(&self) -> usize {
        self.collections
            .iter()
            .filter(|report| report.outcome == CollectionOutcome::Created)
            .count()
    }

    pub fn created_indexes(&self) -> usize {
        self.collections
            .iter()
            .map(|report| report.indexes_created.len())
            .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Drift {
    MissingCollection {
        collection: String,
    },
    MissingIndex {
        collection: String,
        index: String,
    },
    ConflictingIndex {
        collection: String,
        index: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexState {
    Missing,
    Present { name: String },
    Conflict { reason: String },
}

/// Compares a declared index against what the server already holds.
///
/// A same-named index must carry the same keys and uniqueness. An unnamed match on
/// keys counts as present only if uniqueness agrees as well.
pub fn classify_index(spec: &IndexSpec, existing: &[IndexModel]) -> IndexState {
    let name = spec.name();

    if let Some(model) = existing
        .iter()
        .find(|model| name_of(model).as_deref() == Some(name.as_str()))
    {
        if !spec.matches_keys(&model.keys) {
            return IndexState::Conflict {
                reason: format!("existing index has keys {}", model.keys),
            };
        }
        if unique_of(model) != spec.unique {
            return IndexState::Conflict {
                reason: format!(
                    "existing index has unique={}, declared unique={}",
                    unique_of(model),
                    spec.unique
                ),
            };
        }
        return IndexState::Present { name };
    }

    if let Some(model) = existing.iter().find(|model| spec.matches_keys(&model.keys)) {
        let other = name_of(model).unwrap_or_default();
        if unique_of(model) != spec.unique {
            return IndexState::Conflict {
                reason: format!(
                    "index {other} on the same keys has unique={}, declared unique={}",
                    unique_of(model),
                    spec.unique
                ),
            };
        }
        return IndexState::Present { name: other };
    }

    IndexState::Missing
}

fn unique_of(model: &IndexModel) -> bool {
    model
        .options
        .as_ref()
        .and_then(|options| options.unique)
        .unwrap_or(false)
}

fn name_of(model: &IndexModel) -> Option<String> {
    model
        .options
        .as_ref()
        .and_then(|options| options.name.clone())
}

pub struct SchemaInitializer {
    db: Database,
    options: InitOptions,
}

impl SchemaInitializer {
    pub fn new(db: Database, options: InitOptions) -> Self {
        Self { db, options }
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn collection_name(&self, spec: &CollectionSpec) -> String {
        spec.collection_name(&self.options.collection_suffix)
    }

    /// Ensures every declared collection and index exists, then seeds placeholders.
    ///
    /// Stops at the first fatal error; collections handled before it stay applied.
    pub async fn apply(&self) -> SchemaResult<InitReport> {
        let mut existing = self.db.list_collection_names(None).await?;
        let mut report = InitReport::default();

        for spec in COLLECTIONS {
            let name = self.collection_name(spec);
            let outcome = self.ensure_collection(&name, &existing).await?;
            existing.push(name.clone());

            let collection = self.db.collection::<Document>(&name);
            let (indexes_created, indexes_present) =
                self.ensure_indexes(&collection, spec).await?;
            let seed = self.seed_placeholder(&collection, spec).await?;

            info!(
                collection = %name,
                outcome = ?outcome,
                indexes_created = indexes_created.len(),
                indexes_present = indexes_present.len(),
                seed = ?seed,
                "collection ready"
            );
            report.collections.push(CollectionReport {
                collection: name,
                outcome,
                indexes_created,
                indexes_present,
                seed,
            });
        }

        Ok(report)
    }

    async fn ensure_collection(
        &self,
        name: &str,
        existing: &[String],
    ) -> SchemaResult<CollectionOutcome> {
        if existing.iter().any(|present| present == name) {
            return Ok(CollectionOutcome::AlreadyExists);
        }
        match self.db.create_collection(name, None).await {
            Ok(()) => Ok(CollectionOutcome::Created),
            Err(err) if is_namespace_exists(&err) => Ok(CollectionOutcome::AlreadyExists),
            Err(err) => Err(err.into()),
        }
    }

    async fn ensure_indexes(
        &self,
        collection: &Collection<Document>,
        spec: &CollectionSpec,
    ) -> SchemaResult<(Vec<String>, Vec<String>)> {
        let existing = list_indexes(collection).await?;
        let mut created = Vec::new();
        let mut present = Vec::new();

        for index in spec.indexes {
            let name = index.name();
            match classify_index(index, &existing) {
                IndexState::Present { name: found } => {
                    if found != name {
                        warn!(
                            collection = %collection.name(),
                            index = %name,
                            existing = %found,
                            "declared index exists under another name"
                        );
                    }
                    present.push(found);
                }
                IndexState::Conflict { reason } => {
                    return Err(SchemaError::index_conflict(collection.name(), name, reason));
                }
                IndexState::Missing => {
                    if let Err(err) = collection.create_index(index.to_model(), None).await {
                        return Err(index_create_error(collection.name(), &name, err));
                    }
                    created.push(name);
                }
            }
        }

        Ok((created, present))
    }

    async fn seed_placeholder(
        &self,
        collection: &Collection<Document>,
        spec: &CollectionSpec,
    ) -> SchemaResult<SeedOutcome> {
        if !self.options.seed_placeholders {
            return Ok(SeedOutcome::Disabled);
        }
        let options = CountOptions::builder().limit(1u64).build();
        if collection.count_documents(doc! {}, options).await? > 0 {
            return Ok(SeedOutcome::SkippedNonEmpty);
        }
        insert_placeholder(collection, spec).await
    }

    /// Read-only comparison of the live database against the declared schema.
    pub async fn verify(&self) -> SchemaResult<Vec<Drift>> {
        let existing = self.db.list_collection_names(None).await?;
        let mut drift = Vec::new();

        for spec in COLLECTIONS {
            let name = self.collection_name(spec);
            if !existing.iter().any(|present| *present == name) {
                drift.push(Drift::MissingCollection { collection: name });
                continue;
            }
            let collection = self.db.collection::<Document>(&name);
            let indexes = list_indexes(&collection).await?;
            for index in spec.indexes {
                match classify_index(index, &indexes) {
                    IndexState::Present { .. } => {}
                    IndexState::Missing => drift.push(Drift::MissingIndex {
                        collection: name.clone(),
                        index: index.name(),
                    }),
                    IndexState::Conflict { reason } => drift.push(Drift::ConflictingIndex {
                        collection: name.clone(),
                        index: index.name(),
                        reason,
                    }),
                }
            }
        }

        Ok(drift)
    }
}

/// Inserts the placeholder unconditionally. A key collision means it is already there.
pub async fn insert_placeholder(
    collection: &Collection<Document>,
    spec: &CollectionSpec,
) -> SchemaResult<SeedOutcome> {
    let placeholder = (spec.placeholder)(DateTime::now());
    match collection.insert_one(placeholder, None).await {
        Ok(_) => Ok(SeedOutcome::Inserted),
        Err(err) => seed_error_outcome(collection.name(), err),
    }
}

fn seed_error_outcome(collection: &str, err: MongoError) -> SchemaResult<SeedOutcome> {
    if is_duplicate_key(&err) {
        warn!(
            collection = %collection,
            error = %err,
            "placeholder collided with an existing key; leaving collection as is"
        );
        return Ok(SeedOutcome::AlreadySeeded);
    }
    Err(err.into())
}

fn index_create_error(collection: &str, index: &str, err: MongoError) -> SchemaError {
    if is_index_conflict(&err) {
        SchemaError::index_conflict(collection, index, err.to_string())
    } else {
        err.into()
    }
}

pub async fn list_indexes(collection: &Collection<Document>) -> SchemaResult<Vec<IndexModel>> {
    let cursor = collection.list_indexes(None).await?;
    Ok(cursor.try_collect().await?)
}
