// # DNS Provider Trait
//
// Defines the interface to a DNS provider's record-set API.
//
// ## Implementations
//
// - Cloudflare: `ddns-provider-cloudflare` crate
// - In-memory: [`crate::dns::MemoryDnsProvider`]
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::{ChangeBatch, DnsProvider, RecordSet, RecordSetQuery};
// use ddns_core::RecordType;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let query = RecordSetQuery::new("home.example.com.", RecordType::A);
//     let sets = provider.list_record_sets("Z123", &query).await?;
//
//     let set = RecordSet::single("home.example.com.", RecordType::A, 60, "203.0.113.5");
//     provider.change_record_sets("Z123", &ChangeBatch::upsert(set)).await?;
//
//     Ok(())
// }
// ```

use crate::config::RecordType;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Comment attached to change batches issued by this system
pub const CHANGE_COMMENT: &str = "ddns";

/// A provider's representation of one name+type mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordSet {
    /// Fully-qualified, dot-terminated record name
    pub name: String,
    /// Record type as reported by the provider (may be any type, e.g. "CNAME")
    pub record_type: String,
    /// Time-to-live in seconds
    pub ttl: u32,
    /// Record values
    pub values: Vec<String>,
}

impl RecordSet {
    /// Create a single-valued address record set
    pub fn single(
        name: impl Into<String>,
        record_type: RecordType,
        ttl: u32,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            record_type: record_type.as_str().to_string(),
            ttl,
            values: vec![value.into()],
        }
    }

    /// Whether this set is exactly the given name and type
    ///
    /// Names compare ASCII case-insensitively.
    pub fn is(&self, name: &str, record_type: RecordType) -> bool {
        self.name.eq_ignore_ascii_case(name) && self.record_type == record_type.as_str()
    }
}

/// Listing request: start at `name`/`record_type`, return at most `max_items`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordSetQuery {
    /// Name to start listing at
    pub start_name: String,
    /// Type to start listing at
    pub start_type: RecordType,
    /// Maximum number of sets to return
    pub max_items: usize,
}

impl RecordSetQuery {
    /// Query for a single set starting at `name`/`record_type`
    pub fn new(start_name: impl Into<String>, start_type: RecordType) -> Self {
        Self {
            start_name: start_name.into(),
            start_type,
            max_items: 1,
        }
    }
}

/// A change request submitted to the provider in one call
///
/// Every entry is an upsert: the provider creates the set or replaces it
/// entirely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
    /// Free-form comment recorded by providers that support one
    pub comment: String,
    /// Record sets to create or overwrite
    pub upserts: Vec<RecordSet>,
}

impl ChangeBatch {
    /// A batch upserting one record set
    pub fn upsert(record_set: RecordSet) -> Self {
        Self {
            comment: CHANGE_COMMENT.to_string(),
            upserts: vec![record_set],
        }
    }
}

/// Trait for DNS provider implementations
///
/// This trait is the provider's record-set API, nothing more. Deciding
/// whether a write is needed, matching the returned set against the
/// managed name, and mapping failures onto results are owned by
/// [`crate::dns::DnsState`] and [`crate::engine::Reconciler`].
///
/// # Thread Safety
///
/// Implementations must be thread-safe and usable across async tasks.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (each invocation is a single attempt)
/// - ❌ Cache record state beyond a single request (the provider is the system of record)
/// - ❌ Decide whether an update is needed (owned by `Reconciler`)
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List record sets in `zone` starting at the query's name and type
    ///
    /// Providers with start-at semantics may return the lexicographically
    /// next set when the requested one does not exist; callers must check
    /// the returned name and type.
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<RecordSet>)`: Up to `query.max_items` sets, possibly empty
    /// - `Err(Error)`: If the provider call failed
    async fn list_record_sets(
        &self,
        zone: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>, crate::Error>;

    /// Apply a change batch to `zone`
    ///
    /// # Idempotency
    ///
    /// Upserting the same set twice must leave the provider in the same state.
    async fn change_record_sets(&self, zone: &str, batch: &ChangeBatch)
    -> Result<(), crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}

/// Helper trait for constructing DNS providers from configuration
pub trait DnsProviderFactory: Send + Sync {
    /// Create a DnsProvider instance from configuration
    fn create(
        &self,
        config: &crate::config::ProviderConfig,
    ) -> Result<Box<dyn DnsProvider>, crate::Error>;
}
