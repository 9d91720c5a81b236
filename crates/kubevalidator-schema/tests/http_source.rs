//! Integration tests for the HTTP schema source against a wiremock server.
//!
//! `HttpSchemaSource::fetch` is synchronous and bridges onto the ambient
//! runtime with `Handle::block_on`, which panics on an async worker thread.
//! Every call is therefore wrapped in `tokio::task::spawn_blocking`.

use std::sync::Arc;

use kubevalidator_core::SchemaSpec;
use kubevalidator_schema::{
    CachingSchemaSource, HttpSchemaSource, KubeSchemaValidator, SchemaFetchError, SchemaSource,
    StructuralValidator, ValidationRequest, DEFAULT_FETCH_TIMEOUT,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn source() -> Arc<HttpSchemaSource> {
    Arc::new(HttpSchemaSource::new(DEFAULT_FETCH_TIMEOUT).expect("client build"))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn fetches_and_parses_schema() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/master-standalone-strict/service-v1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "object"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let url = format!("{}/master-standalone-strict/service-v1.json", server.uri());
    let source = source();
    let value = tokio::task::spawn_blocking(move || source.fetch(&url))
        .await
        .expect("task")
        .expect("fetch");
    assert_eq!(value["type"], "object");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn not_found_and_server_errors_are_distinguished() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing.json"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let base = server.uri();
    let source = source();
    let (missing, broken) = tokio::task::spawn_blocking(move || {
        (
            source.fetch(&format!("{base}/missing.json")),
            source.fetch(&format!("{base}/broken.json")),
        )
    })
    .await
    .expect("task");

    assert!(matches!(missing, Err(SchemaFetchError::NotFound { .. })));
    assert!(matches!(broken, Err(SchemaFetchError::Status { status: 503, .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn invalid_json_body_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/garbage.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let url = format!("{}/garbage.json", server.uri());
    let source = source();
    let result = tokio::task::spawn_blocking(move || source.fetch(&url))
        .await
        .expect("task");
    assert!(matches!(result, Err(SchemaFetchError::InvalidJson { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn validator_fetches_each_schema_once_through_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.10.3-standalone-strict/configmap-v1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "type": "object",
            "properties": {
                "apiVersion": { "type": "string" },
                "kind": { "type": "string" },
                "data": { "type": "object", "additionalProperties": { "type": "string" } }
            },
            "additionalProperties": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let location = server.uri();
    let cached: Arc<dyn SchemaSource> = Arc::new(CachingSchemaSource::new(source()));
    let validator = KubeSchemaValidator::new(cached);

    let records = tokio::task::spawn_blocking(move || {
        let mut request = ValidationRequest::for_spec("cm.yaml", &SchemaSpec::pinned("1.10.3"));
        request.location = location;
        let good = b"apiVersion: v1\nkind: ConfigMap\ndata:\n  a: b\n";
        let bad = b"apiVersion: v1\nkind: ConfigMap\ndata:\n  a: 1\nextra: true\n";
        let first = validator.validate(good, &request).expect("validate good");
        let second = validator.validate(bad, &request).expect("validate bad");
        (first, second)
    })
    .await
    .expect("task");

    assert!(records.0.is_empty());
    assert_eq!(records.1.len(), 2);
}
