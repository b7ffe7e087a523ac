//! Determinism tests: the same submission against the same server state
//! sends the same commands and produces the same result.

use crate::testing::InMemoryPrimary;
use crate::{
    doc, BulkWriteOptions, Collection, Executor, FindAndModifyOptions, ReturnDocument, WireLimits,
    WriteModel,
};

const DB: &str = "app";
const COLL: &str = "orders";

fn models() -> Vec<WriteModel> {
    let mut models: Vec<_> = (0..7)
        .map(|i| WriteModel::InsertOne {
            document: doc! { "_id": i as i64, "qty": (i * 10) as i64 },
        })
        .collect();
    models.push(WriteModel::InsertOne {
        document: doc! { "_id": 3i64 },
    });
    models.push(WriteModel::UpdateMany {
        filter: doc! { "qty": doc! { "$gte": 30i64 } },
        update: doc! { "$set": doc! { "big": true } },
        upsert: false,
    });
    models.push(WriteModel::FindOneAndUpdate {
        filter: doc! {},
        update: doc! { "$inc": doc! { "qty": 1i64 } },
        options: FindAndModifyOptions {
            sort: Some(doc! { "qty": -1i64 }),
            return_document: Some(ReturnDocument::After),
            ..Default::default()
        },
    });
    models.push(WriteModel::DeleteOne {
        filter: doc! { "_id": 0i64 },
    });
    models
}

fn run_once(options: BulkWriteOptions) -> (Vec<crate::testing::RecordedCommand>, String) {
    let primary = InMemoryPrimary::new();
    let executor = Executor::new(primary.clone()).with_limits(WireLimits::new(3, 1 << 20).unwrap());
    let orders = Collection::new(DB, COLL);
    let result = executor.bulk_write(&orders, models(), options);
    (primary.commands(), format!("{:?}", result))
}

#[test]
fn test_ordered_bulk_is_deterministic() {
    let first = run_once(BulkWriteOptions::ordered());
    for _ in 0..3 {
        assert_eq!(run_once(BulkWriteOptions::ordered()), first);
    }
}

#[test]
fn test_unordered_bulk_is_deterministic() {
    let first = run_once(BulkWriteOptions::unordered());
    for _ in 0..3 {
        assert_eq!(run_once(BulkWriteOptions::unordered()), first);
    }
}

#[test]
fn test_unordered_command_sequence() {
    let (commands, _) = run_once(BulkWriteOptions::unordered());
    let names: Vec<_> = commands.iter().map(|c| c.name().to_string()).collect();
    assert_eq!(
        names,
        vec!["insert", "insert", "insert", "update", "findandmodify", "delete"]
    );
    let sizes: Vec<_> = commands.iter().map(|c| c.operations()).collect();
    assert_eq!(sizes, vec![3, 3, 2, 1, 1, 1]);
}
