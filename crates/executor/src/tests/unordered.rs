//! Unordered bulk writes: every batch is attempted.

use crate::testing::{InMemoryPrimary, DUPLICATE_KEY};
use crate::{
    doc, BulkWriteOptions, BulkWriteResult, Collection, Error, Executor, WireLimits, WriteModel,
};

const DB: &str = "app";
const COLL: &str = "users";

fn setup(limits: WireLimits) -> (InMemoryPrimary, Executor<InMemoryPrimary>, Collection) {
    super::init_tracing();
    let primary = InMemoryPrimary::new();
    let executor = Executor::new(primary.clone()).with_limits(limits);
    (primary, executor, Collection::new(DB, COLL))
}

fn insert(id: i64) -> WriteModel {
    WriteModel::InsertOne {
        document: doc! { "_id": id },
    }
}

fn expect_failure(err: Error) -> BulkWriteResult {
    match err {
        Error::BulkWriteFailure { result } => *result,
        other => panic!("expected BulkWriteFailure, got {:?}", other),
    }
}

#[test]
fn test_duplicate_after_three_thousand_inserts_continues() {
    let (primary, executor, users) = setup(WireLimits::default());
    let mut models: Vec<_> = (0..3000).map(insert).collect();
    models.push(insert(0));
    models.push(insert(3001));

    let result = expect_failure(
        executor
            .bulk_write(&users, models, BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    assert_eq!(result.write_errors.len(), 1);
    assert_eq!(result.write_errors[0].index, 3000);
    assert_eq!(result.write_errors[0].code, DUPLICATE_KEY);
    assert_eq!(result.inserted_count, 3001);
    assert_eq!(primary.count(DB, COLL), 3001);
}

#[test]
fn test_every_batch_is_sent() {
    let (primary, executor, users) = setup(WireLimits::new(2, 1 << 20).unwrap());
    let models = vec![insert(0), insert(1), insert(0), insert(3), insert(4), insert(5)];

    let result = expect_failure(
        executor
            .bulk_write(&users, models, BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    assert_eq!(primary.command_names().len(), 3);
    assert_eq!(result.write_errors[0].index, 2);
    assert_eq!(result.inserted_count, 5);
    assert_eq!(primary.count(DB, COLL), 5);
}

#[test]
fn test_errors_in_several_batches_keep_original_indexes() {
    let (_, executor, users) = setup(WireLimits::new(2, 1 << 20).unwrap());
    let models = vec![insert(0), insert(0), insert(1), insert(1), insert(2)];

    let result = expect_failure(
        executor
            .bulk_write(&users, models, BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    let indexes: Vec<_> = result.write_errors.iter().map(|e| e.index).collect();
    assert_eq!(indexes, vec![1, 3]);
    assert_eq!(result.inserted_count, 3);
}

#[test]
fn test_size_split_with_trailing_duplicate() {
    // 15 large inserts, then a duplicate of the first and one unique insert
    let (primary, executor, users) = setup(WireLimits::new(1000, 1100).unwrap());
    let mut models: Vec<_> = (0..15)
        .map(|i| WriteModel::InsertOne {
            document: doc! { "_id": i as i64, "payload": "x".repeat(300) },
        })
        .collect();
    models.push(insert(0));
    models.push(insert(16));

    let result = expect_failure(
        executor
            .bulk_write(&users, models, BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    assert_eq!(result.write_errors.len(), 1);
    assert_eq!(result.write_errors[0].index, 15);
    assert_eq!(primary.count(DB, COLL), 16);
    assert!(primary.commands().iter().all(|c| c.operations() <= 3 || c.operations() == 5));
}

#[test]
fn test_write_concern_errors_do_not_stop_unordered() {
    let (primary, executor, users) = setup(WireLimits::new(2, 1 << 20).unwrap());
    primary.inject_write_concern_error(64, "waiting for replication timed out");

    let result = expect_failure(
        executor
            .bulk_write(&users, (0..4).map(insert).collect(), BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    assert_eq!(result.write_concern_errors.len(), 2);
    assert_eq!(result.inserted_count, 4);
}

#[test]
fn test_unordered_flag_is_sent() {
    let (primary, executor, users) = setup(WireLimits::default());
    executor
        .bulk_write(&users, vec![insert(1)], BulkWriteOptions::unordered())
        .unwrap();
    assert_eq!(primary.commands()[0].command.get_bool("ordered").ok(), Some(false));
}

#[test]
fn test_mixed_kinds_merge_counts() {
    let (primary, executor, users) = setup(WireLimits::default());
    primary.seed(DB, COLL, vec![doc! { "_id": 9i64, "tag": "old" }]);
    let models = vec![
        insert(1),
        WriteModel::ReplaceOne {
            filter: doc! { "_id": 9i64 },
            replacement: doc! { "tag": "new" },
            upsert: false,
        },
        insert(1),
        WriteModel::DeleteMany {
            filter: doc! { "tag": "new" },
        },
    ];

    let result = expect_failure(
        executor
            .bulk_write(&users, models, BulkWriteOptions::unordered())
            .unwrap_err(),
    );

    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.matched_count, 1);
    assert_eq!(result.modified_count, 1);
    assert_eq!(result.deleted_count, 1);
    assert_eq!(result.write_errors[0].index, 2);
    assert_eq!(primary.documents(DB, COLL), vec![doc! { "_id": 1i64 }]);
}
