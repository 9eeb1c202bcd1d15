mod common;

use anyhow::Result;
use common::{acquire_db_lock, TestDb};
use mongodb::bson::doc;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use nubo_schema::initializer::{insert_placeholder, CollectionOutcome, Drift, SeedOutcome};
use nubo_schema::placeholders::sentinel_filter;
use nubo_schema::schema::{find, COLLECTIONS, USERS};
use nubo_schema::{InitOptions, SchemaError};

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn apply_creates_every_collection_with_its_indexes() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    let report = db.initializer().apply().await?;
    assert_eq!(report.collections.len(), 12);
    assert_eq!(report.created_collections(), 12);

    for spec in COLLECTIONS {
        let names = db.index_names(spec.name).await?;
        for index in spec.indexes {
            assert!(names.contains(&index.name()), "{} missing {}", spec.name, index.name());
        }
        let placeholders = db
            .collection(spec.name)
            .count_documents(sentinel_filter(), None)
            .await?;
        assert_eq!(placeholders, 1, "{}", spec.name);
    }

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn second_run_is_idempotent() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    db.initializer().apply().await?;
    let collections_once = db.collection_names().await?;
    let mut indexes_once = Vec::new();
    for name in &collections_once {
        indexes_once.push(db.index_names(name).await?);
    }

    let second = db.initializer().apply().await?;
    for report in &second.collections {
        assert_eq!(report.outcome, CollectionOutcome::AlreadyExists);
        assert!(report.indexes_created.is_empty());
        assert_eq!(report.seed, SeedOutcome::SkippedNonEmpty);
    }

    let collections_twice = db.collection_names().await?;
    assert_eq!(collections_once, collections_twice);
    for (name, once) in collections_twice.iter().zip(indexes_once.iter()) {
        assert_eq!(&db.index_names(name).await?, once);
    }
    for spec in COLLECTIONS {
        let count = db.collection(spec.name).count_documents(None, None).await?;
        assert_eq!(count, 1, "{}", spec.name);
    }

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn reseeds_after_placeholder_removal_and_skips_populated() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    db.initializer().apply().await?;
    db.collection("media").delete_many(doc! {}, None).await?;
    db.collection("posts")
        .insert_one(doc! { "user_id": common::new_id(), "content": "hello" }, None)
        .await?;

    let report = db.initializer().apply().await?;
    let seed_of = |name: &str| {
        report
            .collections
            .iter()
            .find(|entry| entry.collection == name)
            .map(|entry| entry.seed)
    };
    assert_eq!(seed_of("media"), Some(SeedOutcome::Inserted));
    assert_eq!(seed_of("posts"), Some(SeedOutcome::SkippedNonEmpty));

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn seeding_over_an_existing_placeholder_is_not_fatal() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    db.initializer().apply().await?;
    let users = db.collection("users");
    let spec = find(USERS).expect("users spec");

    let outcome = insert_placeholder(&users, spec).await?;
    assert_eq!(outcome, SeedOutcome::AlreadySeeded);
    assert_eq!(users.count_documents(sentinel_filter(), None).await?, 1);

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn seeding_can_be_disabled() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    let report = db
        .initializer_with(InitOptions {
            seed_placeholders: false,
            ..InitOptions::default()
        })
        .apply()
        .await?;
    assert!(report
        .collections
        .iter()
        .all(|entry| entry.seed == SeedOutcome::Disabled));
    assert_eq!(db.collection("users").count_documents(None, None).await?, 0);

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn suffix_names_tiered_collections() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    db.initializer_with(InitOptions {
        collection_suffix: "_recent".to_string(),
        seed_placeholders: true,
    })
    .apply()
    .await?;

    let names = db.collection_names().await?;
    assert!(names.contains(&"users_recent".to_string()));
    assert!(names.contains(&"conversation_members_recent".to_string()));
    assert!(names.contains(&"feed_cache".to_string()));
    assert!(!names.contains(&"users".to_string()));

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn conflicting_index_aborts_apply() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    let drifted = IndexModel::builder()
        .keys(doc! { "username": 1 })
        .options(IndexOptions::builder().name("username_1".to_string()).build())
        .build();
    db.collection("users").create_index(drifted, None).await?;

    let err = db
        .initializer()
        .apply()
        .await
        .expect_err("non-unique username index must conflict");
    match err {
        SchemaError::IndexConflict {
            collection, index, ..
        } => {
            assert_eq!(collection, "users");
            assert_eq!(index, "username_1");
        }
        other => panic!("unexpected error: {other}"),
    }

    db.cleanup().await?;
    Ok(())
}

#[tokio::test]
#[ignore = "needs a MongoDB server at TEST_MONGO_URI"]
async fn verify_reports_drift_without_changing_anything() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let db = TestDb::new().await?;

    let initializer = db.initializer();
    let drift = initializer.verify().await?;
    assert_eq!(drift.len(), 12);
    assert!(drift
        .iter()
        .all(|entry| matches!(entry, Drift::MissingCollection { .. })));
    assert!(db.collection_names().await?.is_empty());

    initializer.apply().await?;
    assert!(initializer.verify().await?.is_empty());

    db.collection("media").drop_index("owner_id_1", None).await?;
    let drift = initializer.verify().await?;
    assert_eq!(
        drift,
        vec![Drift::MissingIndex {
            collection: "media".to_string(),
            index: "owner_id_1".to_string(),
        }]
    );

    db.cleanup().await?;
    Ok(())
}
