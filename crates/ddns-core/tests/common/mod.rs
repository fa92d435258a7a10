//! Test doubles and common utilities for contract tests
//!
//! This module provides counting and failure-injecting doubles for the
//! reconciler's collaborators.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{ChangeBatch, Clock, DnsProvider, RecordSet, RecordSetQuery, SecretStore};
use ddns_core::{MemoryDnsProvider, Reconciler, RecordConfig, SecretCache, UpdateRequest};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub const ZONE: &str = "Z0123456789";
pub const RECORD: &str = "home.example.com.";
pub const TOKEN: &str = "abc";

/// A clock that only moves when told to
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Mutex::new(Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

/// A memory provider that counts calls and can be told to fail
pub struct CountingDnsProvider {
    inner: MemoryDnsProvider,
    list_calls: AtomicUsize,
    change_calls: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl CountingDnsProvider {
    pub fn new() -> Self {
        Self {
            inner: MemoryDnsProvider::new(),
            list_calls: AtomicUsize::new(0),
            change_calls: AtomicUsize::new(0),
            fail_reads: AtomicBool::new(false),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// The backing records
    pub fn records(&self) -> &MemoryDnsProvider {
        &self.inner
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn change_calls(&self) -> usize {
        self.change_calls.load(Ordering::SeqCst)
    }

    /// Total provider calls of any kind
    pub fn calls(&self) -> usize {
        self.list_calls() + self.change_calls()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl DnsProvider for CountingDnsProvider {
    async fn list_record_sets(&self, zone: &str, query: &RecordSetQuery) -> Result<Vec<RecordSet>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Error::provider("counting", "Rate exceeded"));
        }
        self.inner.list_record_sets(zone, query).await
    }

    async fn change_record_sets(&self, zone: &str, batch: &ChangeBatch) -> Result<()> {
        self.change_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(Error::provider("counting", "Access denied"));
        }
        self.inner.change_record_sets(zone, batch).await
    }

    fn provider_name(&self) -> &'static str {
        "counting"
    }
}

/// A secret store that counts fetches and can be told to fail
pub struct CountingSecretStore {
    value: Mutex<String>,
    fetches: AtomicUsize,
    fail: AtomicBool,
}

impl CountingSecretStore {
    pub fn new(value: &str) -> Self {
        Self {
            value: Mutex::new(value.to_string()),
            fetches: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Change the stored value behind the cache's back
    pub fn set(&self, value: &str) {
        *self.value.lock().unwrap() = value.to_string();
    }
}

#[async_trait]
impl SecretStore for CountingSecretStore {
    async fn get_secret(&self) -> Result<String> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::secret_fetch("secret store unreachable"));
        }
        Ok(self.value.lock().unwrap().clone())
    }

    async fn put_secret(&self, value: &str) -> Result<()> {
        self.set(value);
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "counting"
    }
}

/// A reconciler wired to counting doubles
pub struct Harness {
    pub reconciler: Reconciler,
    pub provider: Arc<CountingDnsProvider>,
    pub store: Arc<CountingSecretStore>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn new(secret: &str) -> Self {
        let provider = Arc::new(CountingDnsProvider::new());
        let store = Arc::new(CountingSecretStore::new(secret));
        let clock = Arc::new(ManualClock::new());
        let cache = Arc::new(SecretCache::new(store.clone(), clock.clone()));
        let reconciler =
            Reconciler::new(cache, provider.clone(), RecordConfig::new(ZONE, RECORD))
                .expect("valid record config");

        Self {
            reconciler,
            provider,
            store,
            clock,
        }
    }

    /// Seed the managed record
    pub async fn seed(&self, record_set: RecordSet) {
        self.provider.records().insert(ZONE, record_set).await;
    }

    /// Current record sets in the zone
    pub async fn record_sets(&self) -> Vec<RecordSet> {
        self.provider.records().record_sets(ZONE).await
    }
}

/// A request carrying `X-Token` and a gateway source address
pub fn request(token: &str, source_ip: &str) -> UpdateRequest {
    UpdateRequest::new()
        .with_header("X-Token", token)
        .with_source_ip(source_ip)
}
