// # Memory DNS Provider
//
// In-memory implementation of DnsProvider.
//
// ## Purpose
//
// Emulates a record-set API with start-at listing: sets are kept ordered by
// (name, type), and a listing returns sets from the requested position
// onward, so a missing record yields whatever follows it. Useful for tests
// and local runs of the daemon.
//
// ## Crash Behavior
//
// - All records are lost on restart

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::ProviderConfig;
use crate::traits::{ChangeBatch, DnsProvider, DnsProviderFactory, RecordSet, RecordSetQuery};

type ZoneRecords = BTreeMap<(String, String), RecordSet>;

/// In-memory DNS provider
///
/// Clones share the same zones.
#[derive(Debug, Clone, Default)]
pub struct MemoryDnsProvider {
    zones: Arc<RwLock<HashMap<String, ZoneRecords>>>,
}

impl MemoryDnsProvider {
    /// Create a provider with no zones
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record set directly (bypassing change batches)
    pub async fn insert(&self, zone: &str, record_set: RecordSet) {
        let mut guard = self.zones.write().await;
        let key = (record_set.name.clone(), record_set.record_type.clone());
        guard
            .entry(zone.to_string())
            .or_default()
            .insert(key, record_set);
    }

    /// All record sets in `zone`, in listing order
    pub async fn record_sets(&self, zone: &str) -> Vec<RecordSet> {
        let guard = self.zones.read().await;
        guard
            .get(zone)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DnsProvider for MemoryDnsProvider {
    async fn list_record_sets(
        &self,
        zone: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, Error> {
        let guard = self.zones.read().await;
        let Some(records) = guard.get(zone) else {
            return Ok(Vec::new());
        };

        let start = (
            query.start_name.clone(),
            query.start_type.as_str().to_string(),
        );
        Ok(records
            .range(start..)
            .take(query.max_items)
            .map(|(_, set)| set.clone())
            .collect())
    }

    async fn change_record_sets(&self, zone: &str, batch: &ChangeBatch) -> Result<(), Error> {
        if batch.upserts.iter().any(|set| set.values.is_empty()) {
            return Err(Error::invalid_input("Record set must have at least one value"));
        }

        let mut guard = self.zones.write().await;
        let records = guard.entry(zone.to_string()).or_default();
        for set in &batch.upserts {
            records.insert((set.name.clone(), set.record_type.clone()), set.clone());
        }

        tracing::debug!(
            "Applied {} upsert(s) to zone {} ({})",
            batch.upserts.len(),
            zone,
            batch.comment
        );
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for [`MemoryDnsProvider`]
pub struct MemoryDnsProviderFactory;

impl DnsProviderFactory for MemoryDnsProviderFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>, Error> {
        match config {
            ProviderConfig::Memory => Ok(Box::new(MemoryDnsProvider::new())),
            _ => Err(Error::config("Invalid config for memory provider")),
        }
    }
}
