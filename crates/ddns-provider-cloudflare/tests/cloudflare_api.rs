//! Cloudflare API behavior against a mock server
//!
//! Verifies the request shapes sent to the v4 API and how responses map onto
//! record sets and errors.

use ddns_core::config::RecordType;
use ddns_core::traits::{ChangeBatch, DnsProvider, RecordSet, RecordSetQuery};
use ddns_core::{
    DnsState, Error, MemorySecretStore, RecordConfig, Reconciler, SecretCache, SystemClock,
    UpdateRequest, UpdateStatus,
};
use ddns_provider_cloudflare::CloudflareProvider;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio_test::assert_ok;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ZONE: &str = "023e105f4ecef8ad9ca31a8372d0c353";
const TOKEN: &str = "cf-test-token";
const NAME: &str = "home.example.com.";

fn provider(server: &MockServer, dry_run: bool) -> CloudflareProvider {
    CloudflareProvider::new(TOKEN, dry_run)
        .unwrap()
        .with_api_base(server.uri())
}

fn envelope(result: Value) -> Value {
    json!({ "success": true, "errors": [], "messages": [], "result": result })
}

fn record(id: &str, record_type: &str, content: &str) -> Value {
    json!({
        "id": id,
        "name": "home.example.com",
        "type": record_type,
        "content": content,
        "ttl": 60,
        "proxied": false
    })
}

async fn mount_lookup(server: &MockServer, record_type: &str, result: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/zones/{ZONE}/dns_records")))
        .and(query_param("name", "home.example.com"))
        .and(query_param("type", record_type))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(result)))
        .mount(server)
        .await;
}

#[tokio::test]
async fn lists_existing_record_as_fqdn_set() {
    let server = MockServer::start().await;
    mount_lookup(&server, "A", json!([record("r1", "A", "203.0.113.5")])).await;

    let sets = assert_ok!(
        provider(&server, false)
            .list_record_sets(ZONE, &RecordSetQuery::new(NAME, RecordType::A))
            .await
    );

    assert_eq!(sets, vec![RecordSet::single(NAME, RecordType::A, 60, "203.0.113.5")]);
}

#[tokio::test]
async fn missing_record_reads_as_absent() {
    let server = MockServer::start().await;
    mount_lookup(&server, "AAAA", json!([])).await;

    let state = DnsState::new(Arc::new(provider(&server, false)));
    let current = assert_ok!(state.current_value(ZONE, NAME, RecordType::Aaaa).await);
    assert_eq!(current, None);
}

#[tokio::test]
async fn upsert_creates_missing_record() {
    let server = MockServer::start().await;
    mount_lookup(&server, "A", json!([])).await;
    Mock::given(method("POST"))
        .and(path(format!("/zones/{ZONE}/dns_records")))
        .and(body_partial_json(json!({
            "type": "A",
            "name": "home.example.com",
            "content": "203.0.113.5",
            "ttl": 60,
            "comment": "ddns"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(record("new", "A", "203.0.113.5"))),
        )
        .expect(1)
        .mount(&server)
        .await;

    let state = DnsState::new(Arc::new(provider(&server, false)));
    assert_ok!(state.upsert(ZONE, NAME, RecordType::A, "203.0.113.5", 60).await);
}

#[tokio::test]
async fn upsert_updates_in_place_and_drops_surplus() {
    let server = MockServer::start().await;
    mount_lookup(
        &server,
        "A",
        json!([record("r1", "A", "192.0.2.1"), record("r2", "A", "192.0.2.2")]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("/zones/{ZONE}/dns_records/r1")))
        .and(body_partial_json(json!({ "content": "203.0.113.5" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(envelope(record("r1", "A", "203.0.113.5"))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/zones/{ZONE}/dns_records/r2")))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({ "id": "r2" }))))
        .expect(1)
        .mount(&server)
        .await;

    let batch = ChangeBatch::upsert(RecordSet::single(NAME, RecordType::A, 60, "203.0.113.5"));
    assert_ok!(provider(&server, false).change_record_sets(ZONE, &batch).await);
}

#[tokio::test]
async fn dry_run_never_writes() {
    let server = MockServer::start().await;
    mount_lookup(&server, "A", json!([record("r1", "A", "192.0.2.1")])).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let batch = ChangeBatch::upsert(RecordSet::single(NAME, RecordType::A, 60, "203.0.113.5"));
    assert_ok!(provider(&server, true).change_record_sets(ZONE, &batch).await);
}

#[tokio::test]
async fn forbidden_lookup_is_upstream_read_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&server)
        .await;

    let state = DnsState::new(Arc::new(provider(&server, false)));
    let err = state
        .current_value(ZONE, NAME, RecordType::A)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamRead(_)));
    assert!(err.to_string().contains("Authentication failed"));
}

#[tokio::test]
async fn rate_limited_write_is_upstream_write_error() {
    let server = MockServer::start().await;
    mount_lookup(&server, "A", json!([])).await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .mount(&server)
        .await;

    let state = DnsState::new(Arc::new(provider(&server, false)));
    let err = state
        .upsert(ZONE, NAME, RecordType::A, "203.0.113.5", 60)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::UpstreamWrite(_)));
    assert!(err.to_string().contains("Rate limit exceeded"));
}

#[tokio::test]
async fn unsuccessful_envelope_is_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": [{ "code": 7003, "message": "Could not route to /zones/bad" }],
            "messages": [],
            "result": null
        })))
        .mount(&server)
        .await;

    let err = provider(&server, false)
        .list_record_sets(ZONE, &RecordSetQuery::new(NAME, RecordType::A))
        .await
        .unwrap_err();

    assert!(err.to_string().contains("7003"));
}

#[tokio::test]
async fn mixed_case_record_name_stays_idempotent() {
    let server = MockServer::start().await;
    mount_lookup(&server, "A", json!([record("r1", "A", "203.0.113.5")])).await;
    Mock::given(method("PUT"))
        .respond_with(ResponseTemplate::new(200).set_body_json(envelope(json!({}))))
        .expect(0)
        .mount(&server)
        .await;

    let cache = Arc::new(SecretCache::new(
        Arc::new(MemorySecretStore::new("abc")),
        Arc::new(SystemClock),
    ));
    let reconciler = Reconciler::new(
        cache,
        Arc::new(provider(&server, false)),
        RecordConfig::new(ZONE, "Home.Example.com"),
    )
    .unwrap();
    let req = UpdateRequest::new()
        .with_header("X-Token", "abc")
        .with_source_ip("203.0.113.5");

    for _ in 0..2 {
        let result = reconciler.reconcile(&req).await;
        assert_eq!(result.status, UpdateStatus::NoChange);
        assert_eq!(result.record, NAME);
    }
}
