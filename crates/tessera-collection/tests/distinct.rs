mod common;

use common::*;
use std::time::Duration;

use serde_json::json;
use tessera_client::{ClientError, TimeoutKind};
use tessera_collection::DataApiError;

#[tokio::test]
async fn distinct_dedups_across_pages() {
    let mock = MockExecutor::new(|call, _| match call {
        0 => ok(json!({ "data": {
            "documents": [{ "a": { "b": 1 } }, { "a": { "b": 2 } }],
            "nextPageState": "p1"
        } })),
        _ => ok(json!({ "data": { "documents": [{ "a": { "b": 1 } }, { "a": { "b": 3 } }] } })),
    });
    let collection = collection(mock.clone());

    let values = collection
        .distinct("a.b", doc(json!({ "kind": "x" })), None)
        .await
        .unwrap();

    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
    assert_eq!(mock.calls(), 2);
    assert_eq!(mock.requests_issued(), vec![1, 2], "pages share one budget");
    assert_eq!(
        body(&mock.commands()[0]),
        json!({
            "filter": { "kind": "x" },
            "projection": { "_id": 0, "a.b": 1 },
            "options": {}
        })
    );
}

#[tokio::test]
async fn distinct_flattens_arrays() {
    let mock = MockExecutor::new(|_, _| {
        ok(json!({ "data": { "documents": [{ "arr": [1, 2] }, { "arr": [2, 3] }] } }))
    });
    let collection = collection(mock);

    let values = collection
        .distinct("arr", doc(json!({})), None)
        .await.unwrap();
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
}

#[tokio::test]
async fn distinct_numeric_path_projects_prefix() {
    let mock = MockExecutor::new(|_, _| {
        ok(json!({ "data": { "documents": [{ "tags": ["x", "y"] }, { "tags": ["x"] }] } }))
    });
    let collection = collection(mock.clone());

    let values = collection
        .distinct("tags.0", doc(json!({})), None)
        .await.unwrap();
    assert_eq!(values, vec![json!("x")]);
    assert_eq!(
        body(&mock.commands()[0])["projection"],
        json!({ "_id": 0, "tags": 1 })
    );
}

#[tokio::test]
async fn distinct_rejects_bad_path_without_request() {
    let mock = MockExecutor::new(|_, _| ok(json!({ "data": { "documents": [] } })));
    let collection = collection(mock.clone());

    let err = collection
        .distinct("a..b", doc(json!({})), None)
        .await.unwrap_err();
    assert!(matches!(err, DataApiError::InvalidArgument(_)));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn distinct_spent_budget_fails_before_fetching() {
    let mock = MockExecutor::new(|_, _| ok(json!({ "data": { "documents": [] } })));
    let collection = collection(mock.clone());

    let err = collection
        .distinct("a", doc(json!({})), Some(Duration::ZERO))
        .await
        .unwrap_err();

    assert!(err.is_hard());
    assert!(matches!(
        err,
        DataApiError::Client(ClientError::Timeout {
            kind: TimeoutKind::GeneralMethod,
            timeout_ms: 0
        })
    ));
    assert_eq!(mock.calls(), 0);
}
