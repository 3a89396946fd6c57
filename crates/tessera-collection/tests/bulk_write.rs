mod common;

use common::*;
use std::time::Duration;

use serde_json::json;
use tessera_client::{ClientError, TimeoutKind};
use tessera_collection::{BulkWriteOperation, BulkWriteOptions, DataApiError};
use tessera_protocol::Command;

fn operations() -> Vec<BulkWriteOperation> {
    vec![
        BulkWriteOperation::InsertOne {
            document: doc(json!({ "_id": "a" })),
        },
        BulkWriteOperation::UpdateOne {
            filter: doc(json!({ "_id": "b" })),
            update: doc(json!({ "$set": { "n": 1 } })),
            upsert: true,
        },
        BulkWriteOperation::UpdateMany {
            filter: doc(json!({ "kind": "x" })),
            update: doc(json!({ "$set": { "n": 2 } })),
            upsert: false,
        },
        BulkWriteOperation::ReplaceOne {
            filter: doc(json!({ "_id": "c" })),
            replacement: doc(json!({ "n": 3 })),
            upsert: false,
        },
        BulkWriteOperation::DeleteOne {
            filter: doc(json!({ "_id": "d" })),
        },
        BulkWriteOperation::DeleteMany {
            filter: doc(json!({ "kind": "y" })),
        },
    ]
}

fn respond(command: &Command) -> Result<tessera_collection::ResponseEnvelope, ClientError> {
    match command {
        Command::InsertOne { .. } => ok(json!({ "status": { "insertedIds": ["a"] } })),
        Command::UpdateOne { .. } => {
            ok(json!({ "status": { "matchedCount": 0, "modifiedCount": 0, "upsertedId": "b" } }))
        }
        Command::UpdateMany { .. } => {
            ok(json!({ "status": { "matchedCount": 5, "modifiedCount": 4 } }))
        }
        Command::FindOneAndReplace { .. } => {
            ok(json!({ "status": { "matchedCount": 1, "modifiedCount": 1 } }))
        }
        Command::DeleteOne { .. } => ok(json!({ "status": { "deletedCount": 1 } })),
        Command::DeleteMany { .. } => ok(json!({ "status": { "deletedCount": 6 } })),
        other => panic!("unexpected {}", other.name()),
    }
}

#[tokio::test]
async fn ordered_runs_each_operation_once_in_order() {
    let mock = MockExecutor::new(|_, command| respond(command));
    let collection = collection(mock.clone());

    let result = collection
        .bulk_write(
            operations(),
            BulkWriteOptions {
                ordered: true,
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let names: Vec<_> = mock.commands().iter().map(Command::name).collect();
    assert_eq!(
        names,
        vec![
            "insertOne",
            "updateOne",
            "updateMany",
            "findOneAndReplace",
            "deleteOne",
            "deleteMany"
        ]
    );
    assert_eq!(mock.peak_in_flight(), 1);
    assert_eq!(mock.requests_issued(), vec![1, 2, 3, 4, 5, 6]);

    assert_eq!(result.inserted_count, 1);
    assert_eq!(result.matched_count, 6);
    assert_eq!(result.modified_count, 5);
    assert_eq!(result.deleted_count, 7);
    assert_eq!(result.upserted_count, 1);
    assert_eq!(result.upserted_ids.get(&1), Some(&json!("b")));
    assert_eq!(result.raw_responses.len(), 6);
}

#[tokio::test]
async fn ordered_stops_at_first_failure() {
    let mock = MockExecutor::new(|call, command| {
        if call == 2 {
            return soft_error("bad update", json!({ "matchedCount": 2, "modifiedCount": 1 }));
        }
        respond(command)
    });
    let collection = collection(mock.clone());

    let err = collection
        .bulk_write(
            operations(),
            BulkWriteOptions {
                ordered: true,
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(mock.calls(), 3);
    let DataApiError::BulkWrite(err) = err else {
        panic!("expected a bulk_write error, got {err:?}");
    };
    let partial = err.partial_result();
    assert_eq!(partial.inserted_count, 1);
    assert_eq!(partial.matched_count, 2);
    assert_eq!(partial.upserted_ids.len(), 1);
    assert_eq!(partial.raw_responses.len(), 3);
}

#[tokio::test]
async fn unordered_attempts_everything_and_indexes_upserts() {
    let mock = MockExecutor::new(|_, command| match command {
        Command::UpdateMany { .. } => soft_error("first", json!({})),
        Command::DeleteOne { .. } => soft_error("second", json!({})),
        other => respond(other),
    });
    let collection = collection(mock.clone());

    let err = collection
        .bulk_write(
            operations(),
            BulkWriteOptions {
                concurrency: Some(4),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(mock.calls(), 6);
    assert_eq!(mock.peak_in_flight(), 4);

    let DataApiError::BulkWrite(err) = err else {
        panic!("expected a bulk_write error, got {err:?}");
    };
    assert_eq!(err.message(), "first (+ 1 more errors)");
    assert_eq!(err.detailed_error_descriptors().len(), 2);
    assert_eq!(err.detailed_error_descriptors()[1].command.name(), "deleteOne");

    let partial = err.partial_result();
    assert_eq!(partial.upserted_ids.get(&1), Some(&json!("b")));
    assert_eq!(partial.deleted_count, 6);
    assert_eq!(partial.raw_responses.len(), 6);
}

#[tokio::test]
async fn ordered_with_concurrency_is_rejected() {
    let mock = MockExecutor::new(|_, command| respond(command));
    let collection = collection(mock.clone());

    let err = collection
        .bulk_write(
            operations(),
            BulkWriteOptions {
                ordered: true,
                concurrency: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DataApiError::InvalidArgument(_)));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn hard_error_propagates_untouched() {
    let mock = MockExecutor::new(|_, command| match command {
        Command::DeleteMany { .. } => Err(ClientError::Transport("reset".into())),
        other => respond(other),
    });
    let collection = collection(mock);

    let err = collection
        .bulk_write(operations(), BulkWriteOptions::default())
        .await
        .unwrap_err();

    assert!(err.is_hard());
    assert!(err.error_descriptors().is_empty());
}

#[tokio::test]
async fn unordered_spent_budget_sends_nothing() {
    let mock = MockExecutor::new(|_, command| respond(command));
    let collection = collection(mock.clone());

    let err = collection
        .bulk_write(
            operations(),
            BulkWriteOptions {
                concurrency: Some(3),
                timeout: Some(Duration::ZERO),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        DataApiError::Client(ClientError::Timeout {
            kind: TimeoutKind::GeneralMethod,
            ..
        })
    ));
    assert_eq!(mock.calls(), 0);
}
