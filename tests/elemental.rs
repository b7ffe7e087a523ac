//! Elemental writes and configuration through the public crate.

use tempfile::TempDir;
use writepath::testing::InMemoryPrimary;
use writepath::{
    doc, Bson, BulkWriteOptions, CONFIG_FILE_NAME, Collection, CoreError, Executor, ReturnDocument,
    WireLimits, WriteConcern, WriteConfig, WriteModel,
};

const DB: &str = "shop";
const COLL: &str = "stock";

fn seeded() -> InMemoryPrimary {
    let primary = InMemoryPrimary::new();
    primary.seed(
        DB,
        COLL,
        vec![
            doc! { "_id": "apple", "qty": 5i64 },
            doc! { "_id": "pear", "qty": 0i64 },
            doc! { "_id": "plum", "qty": 12i64 },
        ],
    );
    primary
}

#[test]
fn restock_and_claim() {
    let primary = seeded();
    let executor = Executor::new(primary.clone());
    let stock = Collection::new(DB, COLL);

    let restocked = executor
        .update_many(
            &stock.find(doc! { "qty": doc! { "$lt": 6i64 } }),
            doc! { "$inc": doc! { "qty": 10i64 } },
        )
        .unwrap();
    assert_eq!(restocked.matched_count, 2);

    let claimed = executor
        .find_one_and_update(
            &stock.find(doc! {}).with_sort(doc! { "qty": -1i64 }),
            doc! { "$inc": doc! { "qty": -1i64 } },
            Some(ReturnDocument::After),
            false,
        )
        .unwrap()
        .expect("a document");
    assert_eq!(claimed.get("_id"), Some(&Bson::from("apple")));
    assert_eq!(claimed.get("qty"), Some(&Bson::Int64(14)));

    let removed = executor
        .remove_one(&stock.find(doc! { "_id": "plum" }))
        .unwrap();
    assert_eq!(removed.deleted_count, 1);
    assert_eq!(primary.count(DB, COLL), 2);
}

#[test]
fn config_file_drives_limits_and_write_concern() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(
        &path,
        r#"
ordered = false
max_batch_count = 2

[write_concern]
w = "majority"
wtimeout_ms = 1000
"#,
    )
    .unwrap();

    let config = WriteConfig::from_file(&path).unwrap();
    let primary = InMemoryPrimary::new();
    let executor = Executor::new(primary.clone()).with_config(config);
    assert_eq!(executor.limits().max_batch_count, 2);

    let models = (0..5)
        .map(|i| WriteModel::InsertOne {
            document: doc! { "_id": i as i64 },
        })
        .collect();
    executor
        .bulk_write(&Collection::new(DB, COLL), models, BulkWriteOptions::unordered())
        .unwrap();

    let commands = primary.commands();
    assert_eq!(commands.len(), 3);
    let sent = commands[0].command.get_document("writeConcern").ok().cloned();
    assert_eq!(sent, Some(WriteConcern::majority().with_timeout_ms(1000).to_document()));
}

#[test]
fn configured_unordered_applies_when_the_call_leaves_it_unset() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "ordered = false\n").unwrap();

    let primary = InMemoryPrimary::new();
    let executor = Executor::new(primary.clone()).with_config(WriteConfig::from_file(&path).unwrap());
    let models = [0i64, 0, 1, 2]
        .into_iter()
        .map(|id| WriteModel::InsertOne {
            document: doc! { "_id": id },
        })
        .collect();

    let err = executor
        .bulk_write(&Collection::new(DB, COLL), models, BulkWriteOptions::default())
        .unwrap_err();

    assert_eq!(err.partial_result().map(|r| r.inserted_count), Some(3));
    assert_eq!(primary.count(DB, COLL), 3);
    let sent: Vec<_> = primary
        .commands()
        .iter()
        .map(|c| c.command.get_bool("ordered").ok())
        .collect();
    assert_eq!(sent, vec![Some(false)]);
}

#[test]
fn config_cannot_loosen_handshake_limits() {
    let config = WriteConfig::from_toml_str("max_batch_count = 5000").unwrap();
    let executor = Executor::new(InMemoryPrimary::new())
        .with_limits(WireLimits::new(100, 1 << 20).unwrap())
        .with_config(config);
    assert_eq!(executor.limits().max_batch_count, 100);
}

#[test]
fn default_config_is_written_once() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);

    WriteConfig::write_default_if_missing(&path).unwrap();
    std::fs::write(&path, "ordered = false\n").unwrap();
    WriteConfig::write_default_if_missing(&path).unwrap();

    let config = WriteConfig::from_file(&path).unwrap();
    assert!(!config.ordered);
}

#[test]
fn invalid_config_names_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(CONFIG_FILE_NAME);
    std::fs::write(&path, "max_message_size = 0\n").unwrap();

    match WriteConfig::from_file(&path) {
        Err(CoreError::InvalidConfig(reason)) => assert!(reason.contains(CONFIG_FILE_NAME)),
        other => panic!("expected InvalidConfig, got {:?}", other),
    }
}
