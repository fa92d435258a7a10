// # Cloudflare DNS Provider
//
// Cloudflare implementation of the record-set `DnsProvider` for the DDNS
// service.
//
// ## Record sets on Cloudflare
//
// Cloudflare stores one record per value and has no record-set object. A set
// is every record sharing a name and type:
//
// - Listing queries the exact name and type, so an absent record yields an
//   empty list rather than the next record in order.
// - An upsert rewrites the existing records in place (PUT), creates what is
//   missing (POST) and deletes any surplus (DELETE), leaving exactly the
//   set's values.
//
// Names are sent without the trailing dot and returned in dot-terminated form.
//
// ## Behavior
//
// - One pass per call, no retry or backoff
// - HTTP timeout of 30 seconds
// - Specific error text for HTTP status codes (401/403, 404, 409, 429, 5xx)
// - Dry-run mode performs reads and logs intended writes
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...&type=...`
// - Create DNS Record: POST `/zones/:zone_id/dns_records`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`
// - Delete DNS Record: DELETE `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use ddns_core::config::{ProviderConfig, ensure_fqdn};
use ddns_core::traits::{ChangeBatch, DnsProvider, DnsProviderFactory, RecordSet, RecordSetQuery};
use ddns_core::{Error, Result};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Cloudflare API base URL
pub const CLOUDFLARE_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

const PROVIDER: &str = "cloudflare";

/// Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    message: String,
}

/// A single Cloudflare DNS record
#[derive(Debug, Clone, Deserialize)]
struct DnsRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
    content: String,
    #[serde(default)]
    ttl: u32,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests
/// - Log the intended writes
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform reads but skip writes
    dry_run: bool,
}

impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Cloudflare API token with Zone:DNS:Edit permissions
    /// - `dry_run`: If true, perform reads but skip writes
    ///
    /// # Returns
    ///
    /// - `Ok(CloudflareProvider)`: Ready to use
    /// - `Err(Error::Config)`: The token is empty
    /// - `Err(Error::Http)`: The HTTP client could not be built
    pub fn new(api_token: impl Into<String>, dry_run: bool) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_token,
            api_base: CLOUDFLARE_API_BASE.to_string(),
            client,
            dry_run,
        })
    }

    /// Create a provider in live mode
    pub fn new_live(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, false)
    }

    /// Create a provider in dry-run mode
    pub fn new_dry_run(api_token: impl Into<String>) -> Result<Self> {
        Self::new(api_token, true)
    }

    /// Point the provider at a different API base URL
    pub fn with_api_base(mut self, api_base: impl AsRef<str>) -> Self {
        self.api_base = api_base.as_ref().trim_end_matches('/').to_string();
        self
    }

    /// Whether writes are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    fn record_url(&self, zone_id: &str, record_id: &str) -> String {
        format!("{}/{}", self.records_url(zone_id), record_id)
    }

    /// Records with exactly `name` and `record_type`
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /zones/:zone_id/dns_records?name=home.example.com&type=A
    /// Authorization: Bearer <token>
    /// ```
    async fn find_records(
        &self,
        zone_id: &str,
        name: &str,
        record_type: &str,
    ) -> Result<Vec<DnsRecord>> {
        let api_name = name.trim_end_matches('.');
        tracing::debug!("Looking up {} records for {}", record_type, api_name);

        let response = self
            .client
            .get(self.records_url(zone_id))
            .bearer_auth(&self.api_token)
            .query(&[("name", api_name), ("type", record_type)])
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let records: Vec<DnsRecord> = read_result(response, "Record lookup").await?;
        Ok(records
            .into_iter()
            .filter(|r| r.record_type.eq_ignore_ascii_case(record_type))
            .collect())
    }

    async fn create_record(&self, zone_id: &str, payload: serde_json::Value) -> Result<()> {
        let response = self
            .client
            .post(self.records_url(zone_id))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let _: DnsRecord = read_result(response, "Failed to create record").await?;
        Ok(())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        payload: serde_json::Value,
    ) -> Result<()> {
        let response = self
            .client
            .put(self.record_url(zone_id, record_id))
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let _: DnsRecord = read_result(response, "Failed to update record").await?;
        Ok(())
    }

    async fn delete_record(&self, zone_id: &str, record_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.record_url(zone_id, record_id))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let _: serde_json::Value = read_result(response, "Failed to delete record").await?;
        Ok(())
    }

    /// Make the records for `set` hold exactly its values
    async fn apply_upsert(&self, zone_id: &str, set: &RecordSet, comment: &str) -> Result<()> {
        let existing = self.find_records(zone_id, &set.name, &set.record_type).await?;

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would set {} {} to {:?} (ttl {}), currently {:?}",
                set.name,
                set.record_type,
                set.values,
                set.ttl,
                existing.iter().map(|r| r.content.as_str()).collect::<Vec<_>>()
            );
            return Ok(());
        }

        for (i, content) in set.values.iter().enumerate() {
            let payload = record_payload(set, content, comment);
            match existing.get(i) {
                Some(record) => self.update_record(zone_id, &record.id, payload).await?,
                None => self.create_record(zone_id, payload).await?,
            }
        }

        for surplus in existing.iter().skip(set.values.len()) {
            self.delete_record(zone_id, &surplus.id).await?;
        }

        tracing::info!(
            "Cloudflare record set {} {} now {:?}",
            set.name,
            set.record_type,
            set.values
        );
        Ok(())
    }
}

fn record_payload(set: &RecordSet, content: &str, comment: &str) -> serde_json::Value {
    json!({
        "type": set.record_type,
        "name": set.name.trim_end_matches('.'),
        "content": content,
        "ttl": set.ttl,
        "proxied": false,
        "comment": comment,
    })
}

/// Map a non-success HTTP status to a provider error
fn status_error(status: StatusCode, body: &str, context: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::provider(
            PROVIDER,
            format!(
                "Authentication failed: Invalid API token or insufficient permissions. Status: {}",
                status
            ),
        ),
        404 => Error::not_found(format!("{}: zone or record not found ({})", context, status)),
        409 => Error::provider(
            PROVIDER,
            format!(
                "Conflict: Record is being updated by another process. Status: {}",
                status
            ),
        ),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Please retry later. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error (transient): {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("{}: {} - {}", context, status, body)),
    }
}

/// Check the status and unwrap the v4 envelope
async fn read_result<T: DeserializeOwned>(
    response: reqwest::Response,
    context: &str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unable to read error response".to_string());
        return Err(status_error(status, &body, context));
    }

    let envelope: Envelope<T> = response
        .json()
        .await
        .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

    if !envelope.success {
        let detail = envelope
            .errors
            .iter()
            .map(|e| format!("{} ({})", e.message, e.code))
            .collect::<Vec<_>>()
            .join("; ");
        return Err(Error::provider(PROVIDER, format!("{}: {}", context, detail)));
    }

    envelope.result.ok_or_else(|| {
        Error::provider(PROVIDER, format!("{}: response carried no result", context))
    })
}

/// Group Cloudflare records into one record set
fn to_record_set(records: Vec<DnsRecord>) -> Option<RecordSet> {
    let first = records.first()?;
    let mut set = RecordSet {
        name: ensure_fqdn(&first.name),
        record_type: first.record_type.to_ascii_uppercase(),
        ttl: first.ttl,
        values: Vec::with_capacity(records.len()),
    };
    set.values.extend(records.into_iter().map(|r| r.content));
    Some(set)
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn list_record_sets(
        &self,
        zone_id: &str,
        query: &RecordSetQuery,
    ) -> Result<Vec<RecordSet>> {
        let records = self
            .find_records(zone_id, &query.start_name, query.start_type.as_str())
            .await?;

        Ok(to_record_set(records)
            .into_iter()
            .take(query.max_items)
            .collect())
    }

    async fn change_record_sets(&self, zone_id: &str, batch: &ChangeBatch) -> Result<()> {
        for set in &batch.upserts {
            if set.values.is_empty() {
                return Err(Error::invalid_input("Record set must have at least one value"));
            }
            tracing::info!(
                "Upserting Cloudflare record {} {} [mode: {}]",
                set.name,
                set.record_type,
                if self.dry_run { "DRY-RUN" } else { "LIVE" }
            );
            self.apply_upsert(zone_id, set, &batch.comment).await?;
        }
        Ok(())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}

/// Factory for creating Cloudflare providers
pub struct CloudflareFactory;

impl DnsProviderFactory for CloudflareFactory {
    fn create(&self, config: &ProviderConfig) -> Result<Box<dyn DnsProvider>> {
        match config {
            ProviderConfig::Cloudflare {
                api_token,
                api_base,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "Cloudflare provider running in DRY-RUN mode - no changes will be made"
                    );
                }

                let mut provider = CloudflareProvider::new(api_token.clone(), *dry_run)?;
                if let Some(base) = api_base {
                    provider = provider.with_api_base(base);
                }
                Ok(Box::new(provider))
            }
            _ => Err(Error::config("Invalid config for Cloudflare provider")),
        }
    }
}

/// Register the Cloudflare provider with a registry
///
/// # Example
///
/// ```rust
/// use ddns_core::ProviderRegistry;
///
/// let registry = ProviderRegistry::with_builtins();
/// ddns_provider_cloudflare::register(&registry);
/// assert!(registry.has_provider("cloudflare"));
/// ```
pub fn register(registry: &ddns_core::ProviderRegistry) {
    registry.register_provider(PROVIDER, Box::new(CloudflareFactory));
}
