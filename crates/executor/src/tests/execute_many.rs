//! Tests for the execute_many batch execution method.
//!
//! These tests verify that results line up with the submitted commands and
//! that one failing command does not stop the rest.

use crate::testing::InMemoryPrimary;
use crate::{doc, Bson, Collection, Command, Error, Executor, Output, ReturnDocument, WriteModel};

const DB: &str = "app";
const COLL: &str = "items";

fn create_test_executor() -> (InMemoryPrimary, Executor<InMemoryPrimary>) {
    let primary = InMemoryPrimary::new();
    primary.seed(
        DB,
        COLL,
        vec![doc! { "_id": 1i64, "n": 1i64 }, doc! { "_id": 2i64, "n": 2i64 }],
    );
    (primary.clone(), Executor::new(primary))
}

#[test]
fn test_execute_many_empty() {
    let (primary, executor) = create_test_executor();
    let results = executor.execute_many(&Collection::new(DB, COLL), vec![]);
    assert!(results.is_empty());
    assert_eq!(primary.contexts_acquired(), 0);
}

#[test]
fn test_execute_many_results_in_order() {
    let (_, executor) = create_test_executor();
    let view = Collection::new(DB, COLL).find(doc! { "_id": 1i64 });

    let results = executor.execute_many(
        &view,
        vec![
            Command::UpdateOne {
                update: doc! { "$inc": doc! { "n": 10i64 } },
            },
            Command::FindOneAndUpdate {
                update: doc! { "$inc": doc! { "n": 1i64 } },
                return_document: Some(ReturnDocument::After),
                upsert: false,
            },
            Command::RemoveOne,
        ],
    );

    assert_eq!(results.len(), 3);
    match &results[0] {
        Ok(Output::WriteResult(result)) => assert_eq!(result.modified_count, 1),
        other => panic!("Expected WriteResult, got {:?}", other),
    }
    match &results[1] {
        Ok(Output::Document(Some(document))) => {
            assert_eq!(document.get("n"), Some(&Bson::Int64(12)))
        }
        other => panic!("Expected Document, got {:?}", other),
    }
    match &results[2] {
        Ok(Output::WriteResult(result)) => assert_eq!(result.deleted_count, 1),
        other => panic!("Expected WriteResult, got {:?}", other),
    }
}

#[test]
fn test_execute_many_continues_after_failure() {
    let (primary, executor) = create_test_executor();
    let items = Collection::new(DB, COLL);

    let results = executor.execute_many(
        &items,
        vec![
            Command::BulkWrite {
                models: vec![WriteModel::InsertOne {
                    document: doc! { "_id": 1i64 },
                }],
                options: Default::default(),
            },
            Command::BulkWrite {
                models: vec![WriteModel::InsertOne {
                    document: doc! { "_id": 3i64 },
                }],
                options: Default::default(),
            },
        ],
    );

    assert!(matches!(results[0], Err(Error::BulkWriteFailure { .. })));
    assert!(matches!(results[1], Ok(Output::WriteResult(ref r)) if r.inserted_count == 1));
    assert_eq!(primary.count(DB, COLL), 3);
}

#[test]
fn test_execute_many_each_command_acquires_a_context() {
    let (primary, executor) = create_test_executor();
    let view = Collection::new(DB, COLL).find(doc! { "n": doc! { "$gt": 100i64 } });

    let results = executor.execute_many(&view, vec![Command::RemoveMany, Command::FindOneAndDelete]);

    assert!(matches!(results[0], Ok(Output::WriteResult(ref r)) if r.deleted_count == 0));
    assert!(matches!(results[1], Ok(Output::Document(None))));
    assert_eq!(primary.contexts_acquired(), 2);
}
