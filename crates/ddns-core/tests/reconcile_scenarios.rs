//! Contract Test: Reconciliation Outcomes
//!
//! Drives the reconciler end to end against counting doubles.
//!
//! Constraints verified:
//! - Each terminal state maps to exactly one status code
//! - Denied and unresolvable requests never reach the DNS provider
//! - An unchanged address never causes a write
//! - Upstream failures are reported, not retried
//!
//! If this test fails, the update flow is broken.

mod common;

use common::*;
use ddns_core::config::RecordType;
use ddns_core::traits::RecordSet;
use ddns_core::{UpdateRequest, UpdateStatus};

#[tokio::test]
async fn absent_record_is_created() {
    let h = Harness::new(TOKEN);

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::Updated);
    assert_eq!(result.status_code(), 200);
    assert_eq!(result.record, RECORD);
    assert_eq!(result.record_type, Some(RecordType::A));
    assert_eq!(result.old_value, None);
    assert_eq!(result.new_value.as_deref(), Some("203.0.113.5"));
    assert_eq!(result.ttl, 60);
    assert_eq!(h.provider.change_calls(), 1);

    let sets = h.record_sets().await;
    assert_eq!(sets, vec![RecordSet::single(RECORD, RecordType::A, 60, "203.0.113.5")]);
}

#[tokio::test]
async fn matching_record_is_no_change() {
    let h = Harness::new(TOKEN);
    h.seed(RecordSet::single(RECORD, RecordType::A, 60, "203.0.113.5"))
        .await;

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::NoChange);
    assert_eq!(result.ip.as_deref(), Some("203.0.113.5"));
    assert_eq!(h.provider.list_calls(), 1);
    assert_eq!(h.provider.change_calls(), 0);
}

#[tokio::test]
async fn missing_token_is_unauthorized_without_dns_calls() {
    let h = Harness::new(TOKEN);

    let req = UpdateRequest::new().with_source_ip("203.0.113.5");
    let result = h.reconciler.reconcile(&req).await;

    assert_eq!(result.status, UpdateStatus::Unauthorized);
    assert_eq!(result.status_code(), 401);
    assert_eq!(result.message.as_deref(), Some("Unauthorized"));
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn wrong_token_is_unauthorized_without_dns_calls() {
    let h = Harness::new(TOKEN);

    let result = h.reconciler.reconcile(&request("abd", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::Unauthorized);
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn ipv6_caller_reads_and_writes_aaaa() {
    let h = Harness::new(TOKEN);
    h.seed(RecordSet::single(RECORD, RecordType::A, 60, "203.0.113.5"))
        .await;

    let result = h.reconciler.reconcile(&request("abc", "2001:db8::1")).await;

    assert_eq!(result.status, UpdateStatus::Updated);
    assert_eq!(result.record_type, Some(RecordType::Aaaa));
    // The A record is a different set and is not reported as the old value
    assert_eq!(result.old_value, None);

    let sets = h.record_sets().await;
    assert_eq!(sets.len(), 2);
    assert!(sets.iter().any(|s| s.is(RECORD, RecordType::A)));
    assert!(
        sets.iter()
            .any(|s| s.is(RECORD, RecordType::Aaaa) && s.values == vec!["2001:db8::1".to_string()])
    );
}

#[tokio::test]
async fn secret_fetch_failure_is_unauthorized() {
    let h = Harness::new(TOKEN);
    h.store.fail(true);

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::Unauthorized);
    assert_eq!(h.provider.calls(), 0);
    assert!(h.record_sets().await.is_empty());
}

#[tokio::test]
async fn unusable_address_is_bad_request_without_dns_calls() {
    let h = Harness::new(TOKEN);

    for req in [
        UpdateRequest::new().with_header("X-Token", "abc"),
        request("abc", "not-an-ip"),
        UpdateRequest::new()
            .with_header("X-Token", "abc")
            .with_header("X-Forwarded-For", "garbage, 203.0.113.5"),
    ] {
        let result = h.reconciler.reconcile(&req).await;
        assert_eq!(result.status, UpdateStatus::BadRequest);
        assert_eq!(result.status_code(), 400);
        assert!(result.message.is_some());
    }
    assert_eq!(h.provider.calls(), 0);
}

#[tokio::test]
async fn forwarded_for_is_used_when_source_is_blank() {
    let h = Harness::new(TOKEN);

    let req = UpdateRequest::new()
        .with_query("token", "abc")
        .with_source_ip("")
        .with_header("x-forwarded-for", "198.51.100.7, 10.0.0.1");
    let result = h.reconciler.reconcile(&req).await;

    assert_eq!(result.status, UpdateStatus::Updated);
    assert_eq!(result.new_value.as_deref(), Some("198.51.100.7"));
}

#[tokio::test]
async fn second_identical_call_does_not_write() {
    let h = Harness::new(TOKEN);
    let req = request("abc", "203.0.113.5");

    let first = h.reconciler.reconcile(&req).await;
    let second = h.reconciler.reconcile(&req).await;

    assert_eq!(first.status, UpdateStatus::Updated);
    assert_eq!(second.status, UpdateStatus::NoChange);
    assert_eq!(h.provider.change_calls(), 1);
}

#[tokio::test]
async fn address_change_reports_old_and_new() {
    let h = Harness::new(TOKEN);
    h.seed(RecordSet::single(RECORD, RecordType::A, 60, "198.51.100.1"))
        .await;

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::Updated);
    assert_eq!(result.old_value.as_deref(), Some("198.51.100.1"));
    assert_eq!(result.new_value.as_deref(), Some("203.0.113.5"));
}

#[tokio::test]
async fn neighbouring_record_is_not_mistaken_for_managed_one() {
    let h = Harness::new(TOKEN);
    // Sorts directly after the managed record, so a start-at listing returns it
    h.seed(RecordSet::single("hub.example.com.", RecordType::A, 300, "203.0.113.5"))
        .await;

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::Updated);
    assert_eq!(result.old_value, None);
    assert_eq!(h.record_sets().await.len(), 2);
}

#[tokio::test]
async fn upstream_read_failure_is_reported_once() {
    let h = Harness::new(TOKEN);
    h.provider.fail_reads(true);

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::UpstreamError);
    assert_eq!(result.status_code(), 500);
    assert_eq!(result.record_type, Some(RecordType::A));
    assert!(result.message.as_deref().unwrap_or_default().contains("Rate exceeded"));
    assert_eq!(h.provider.list_calls(), 1);
    assert_eq!(h.provider.change_calls(), 0);
}

#[tokio::test]
async fn upstream_write_failure_leaves_record_unchanged() {
    let h = Harness::new(TOKEN);
    h.seed(RecordSet::single(RECORD, RecordType::A, 60, "198.51.100.1"))
        .await;
    h.provider.fail_writes(true);

    let result = h.reconciler.reconcile(&request("abc", "203.0.113.5")).await;

    assert_eq!(result.status, UpdateStatus::UpstreamError);
    assert!(result.message.as_deref().unwrap_or_default().contains("Access denied"));
    assert_eq!(h.provider.change_calls(), 1);
    assert_eq!(h.record_sets().await[0].values, vec!["198.51.100.1".to_string()]);
}
