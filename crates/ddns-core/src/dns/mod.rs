// # DNS State Reader / Writer
//
// Reads the managed record's current value from the provider and issues the
// upsert when the reconciler decides to write.
//
// ## Exact-match reads
//
// Providers with start-at listing semantics return the next record set in
// order when the requested one does not exist. A returned set whose name or
// type differs from the request is therefore "absent", never a value.

pub mod memory;

pub use memory::{MemoryDnsProvider, MemoryDnsProviderFactory};

use std::sync::Arc;
use tracing::debug;

use crate::config::RecordType;
use crate::error::{Error, Result};
use crate::traits::{ChangeBatch, DnsProvider, RecordSet, RecordSetQuery};

/// Reads and writes the managed record through a [`DnsProvider`]
#[derive(Clone)]
pub struct DnsState {
    provider: Arc<dyn DnsProvider>,
}

impl DnsState {
    /// Wrap a provider
    pub fn new(provider: Arc<dyn DnsProvider>) -> Self {
        Self { provider }
    }

    /// Name of the underlying provider
    pub fn provider_name(&self) -> &'static str {
        self.provider.provider_name()
    }

    /// Current value of `name`/`record_type` in `zone`
    ///
    /// # Returns
    ///
    /// - `Ok(Some(value))`: The first value of the exactly-matching set
    /// - `Ok(None)`: No matching set, or a matching set without values
    /// - `Err(Error::UpstreamRead)`: The provider call failed
    pub async fn current_value(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
    ) -> Result<Option<String>> {
        let query = RecordSetQuery::new(name, record_type);
        let sets = self
            .provider
            .list_record_sets(zone, &query)
            .await
            .map_err(|e| Error::upstream_read(e.to_string()))?;

        let Some(set) = sets.into_iter().next() else {
            return Ok(None);
        };

        if !set.is(name, record_type) {
            debug!(
                "Provider returned {} {} for {} {}, treating as absent",
                set.name, set.record_type, name, record_type
            );
            return Ok(None);
        }

        Ok(set.values.into_iter().next())
    }

    /// Replace `name`/`record_type` in `zone` with the single `value`
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The provider accepted the change batch
    /// - `Err(Error::UpstreamWrite)`: The provider call failed; the record keeps its prior value
    pub async fn upsert(
        &self,
        zone: &str,
        name: &str,
        record_type: RecordType,
        value: &str,
        ttl: u32,
    ) -> Result<()> {
        let batch = ChangeBatch::upsert(RecordSet::single(name, record_type, ttl, value));
        self.provider
            .change_record_sets(zone, &batch)
            .await
            .map_err(|e| Error::upstream_write(e.to_string()))
    }
}
