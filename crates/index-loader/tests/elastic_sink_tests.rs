//! Bulk sink tests against a mock search backend.

use std::sync::Arc;
use std::time::Duration;

use index_loader::{
    BulkSink, ElasticSink, LoadError, Properties, ReshapedBatch, ResultQueue, TargetConfig, Value,
};
use serde_json::json;
use wiremock::matchers::{basic_auth, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn target(server: &MockServer) -> TargetConfig {
    TargetConfig {
        url: server.uri(),
        index: "products".to_string(),
        index_type: None,
        username: None,
        password: None,
        request_timeout_secs: 5,
    }
}

fn batch(names: &[&str]) -> Arc<ReshapedBatch> {
    let documents = names
        .iter()
        .map(|name| {
            let mut doc = Properties::new();
            doc.insert("name".into(), Value::from(*name));
            doc
        })
        .collect();
    Arc::new(ReshapedBatch {
        documents,
        index_type: None,
    })
}

fn accepted(count: usize) -> serde_json::Value {
    let items: Vec<_> = (0..count)
        .map(|i| json!({ "index": { "_id": format!("id{}", i), "status": 201 } }))
        .collect();
    json!({ "took": 3, "errors": false, "items": items })
}

#[tokio::test]
async fn test_accepted_bulk_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(header("content-type", "application/x-ndjson"))
        .and(body_string_contains(r#"{"index":{"_index":"products"}}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted(2)))
        .expect(1)
        .mount(&server)
        .await;

    let queue = ResultQueue::unbounded();
    let sink = ElasticSink::new(&target(&server), queue.clone()).unwrap();
    let handle = sink.dispatch("a.json_0", batch(&["lamp", "desk"])).await.unwrap();
    assert_eq!(handle.correlation_id(), "a.json_0");
    assert!(handle.wait(Duration::from_secs(5)).await.unwrap());

    let result = queue.drain().await.unwrap();
    assert_eq!(result.correlation_id, "a.json_0");
    assert_eq!(result.index, "products");
    assert_eq!(result.items.len(), 2);
    assert!(result.is_success());
    assert!(!result.request_id.is_empty());
}

#[tokio::test]
async fn test_rejected_items_are_reported() {
    let server = MockServer::start().await;
    let body = json!({
        "took": 1,
        "errors": true,
        "items": [
            { "index": { "_id": "ok", "status": 201 } },
            { "index": { "_id": "bad", "status": 400, "error": {
                "type": "mapper_parsing_exception",
                "reason": "failed to parse field [price]"
            } } }
        ]
    });
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;

    let queue = ResultQueue::unbounded();
    let sink = ElasticSink::new(&target(&server), queue.clone()).unwrap();
    let handle = sink.dispatch("b_3", batch(&["x", "y"])).await.unwrap();
    assert!(!handle.wait(Duration::from_secs(5)).await.unwrap());

    let result = queue.drain().await.unwrap();
    assert!(result.has_failures());
    let failed: Vec<_> = result.failed_items().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].id.as_deref(), Some("bad"));
    assert_eq!(failed[0].status, 400);
    assert_eq!(
        failed[0].error.as_ref().unwrap().kind,
        "mapper_parsing_exception"
    );
}

#[tokio::test]
async fn test_server_error_records_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(500).set_body_string("cluster unavailable"))
        .mount(&server)
        .await;

    let queue = ResultQueue::unbounded();
    let sink = ElasticSink::new(&target(&server), queue.clone()).unwrap();
    let handle = sink.dispatch("c_0", batch(&["z"])).await.unwrap();
    let err = handle.wait(Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, LoadError::Sink(_)));
    assert!(err.to_string().contains("cluster unavailable"));

    let result = queue.drain().await.unwrap();
    assert_eq!(result.correlation_id, "c_0");
    assert!(result.items.is_empty());
    assert!(result.failure.unwrap().contains("500"));
}

#[tokio::test]
async fn test_basic_auth_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .and(basic_auth("loader", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted(1)))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = target(&server);
    config.username = Some("loader".to_string());
    config.password = Some("secret".to_string());
    let sink = ElasticSink::new(&config, ResultQueue::unbounded()).unwrap();
    let handle = sink.dispatch("d_0", batch(&["w"])).await.unwrap();
    assert!(handle.wait(Duration::from_secs(5)).await.unwrap());
}

#[tokio::test]
async fn test_empty_batch_is_not_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted(0)))
        .expect(0)
        .mount(&server)
        .await;

    let queue = ResultQueue::unbounded();
    let sink = ElasticSink::new(&target(&server), queue.clone()).unwrap();
    let handle = sink.dispatch("e_0", batch(&[])).await.unwrap();
    assert!(handle.wait(Duration::from_secs(1)).await.unwrap());
    assert!(queue.is_empty());
}

#[tokio::test]
async fn test_full_bounded_queue_overflows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/_bulk"))
        .respond_with(ResponseTemplate::new(200).set_body_json(accepted(1)))
        .mount(&server)
        .await;

    let queue = ResultQueue::bounded(1, Duration::from_millis(50)).unwrap();
    let sink = ElasticSink::new(&target(&server), queue.clone()).unwrap();

    let first = sink.dispatch("f_0", batch(&["a"])).await.unwrap();
    assert!(first.wait(Duration::from_secs(5)).await.unwrap());

    // nobody drains, so the second outcome cannot be recorded
    let second = sink.dispatch("f_1", batch(&["b"])).await.unwrap();
    let err = second.wait(Duration::from_secs(5)).await.unwrap_err();
    assert!(matches!(err, LoadError::QueueOverflow { .. }));
    assert_eq!(queue.len(), 1);
}
