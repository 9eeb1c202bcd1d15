use chrono::{Duration as ChronoDuration, Utc};
use mongodb::bson::{doc, DateTime, Document};
use mongodb::Database;
use tracing::{error, info};

use crate::error::SchemaResult;
use crate::placeholders::{sentinel_filter, sentinel_id};
use crate::schema::COLLECTIONS;

/// Deletes the seeded placeholder from every schema collection. Indexes stay.
pub async fn remove_placeholders(db: &Database, suffix: &str) -> SchemaResult<u64> {
    let mut removed = 0;
    for spec in COLLECTIONS {
        let name = spec.collection_name(suffix);
        let result = db
            .collection::<Document>(&name)
            .delete_one(sentinel_filter(), None)
            .await?;
        if result.deleted_count > 0 {
            info!(collection = %name, "placeholder removed");
        }
        removed += result.deleted_count;
    }
    Ok(removed)
}

/// Cutoff for documents considered stale, `days` before now.
///
/// Day counts too large to represent clamp to the earliest date, which prunes nothing.
pub fn stale_threshold(days: i64) -> DateTime {
    ChronoDuration::try_days(days.max(0))
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .map(|cutoff| DateTime::from_millis(cutoff.timestamp_millis()))
        .unwrap_or(DateTime::MIN)
}

pub fn stale_filter(threshold: DateTime) -> Document {
    doc! {
        "last_used": { "$lt": threshold },
        "_id": { "$ne": sentinel_id() },
    }
}

#[derive(Debug, Default)]
pub struct PruneReport {
    pub deleted: u64,
    pub failed_collections: Vec<String>,
}

/// Removes documents whose `last_used` is older than `days`.
///
/// A failure on one collection is logged and the sweep moves on.
pub async fn prune_stale(db: &Database, suffix: &str, days: i64) -> SchemaResult<PruneReport> {
    let filter = stale_filter(stale_threshold(days));
    let mut report = PruneReport::default();

    for spec in COLLECTIONS {
        let name = spec.collection_name(suffix);
        match db
            .collection::<Document>(&name)
            .delete_many(filter.clone(), None)
            .await
        {
            Ok(result) => {
                info!(collection = %name, deleted = result.deleted_count, "pruned stale documents");
                report.deleted += result.deleted_count;
            }
            Err(err) => {
                error!(collection = %name, error = %err, "failed to prune collection");
                report.failed_collections.push(name);
            }
        }
    }

    Ok(report)
}
