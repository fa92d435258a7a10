//! Configuration types for the DDNS system
//!
//! This module defines all configuration structures used throughout the crate.
//! A deployment manages exactly one record in one zone, guarded by one shared
//! token held in one secret store.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Record TTL used when none is configured (or the configured value is unparseable)
pub const DEFAULT_TTL_SECS: u32 = 60;

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// The managed record
    pub record: RecordConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Secret store configuration (where the shared token lives)
    pub secret_store: SecretStoreConfig,
}

impl DdnsConfig {
    /// Create a new configuration
    pub fn new(
        record: RecordConfig,
        provider: ProviderConfig,
        secret_store: SecretStoreConfig,
    ) -> Self {
        Self {
            record,
            provider,
            secret_store,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.record.validate()?;
        self.provider.validate()?;
        self.secret_store.validate()?;
        Ok(())
    }
}

/// The single record managed by a deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordConfig {
    /// Hosted zone identifier at the DNS provider
    pub zone_id: String,

    /// Fully-qualified record name, always dot-terminated
    pub name: String,

    /// Record TTL in seconds (fixed per deployment)
    #[serde(default = "default_ttl")]
    pub ttl: u32,
}

impl RecordConfig {
    /// Create a new record configuration
    ///
    /// The name is normalized to its dot-terminated form.
    pub fn new(zone_id: impl Into<String>, name: impl AsRef<str>) -> Self {
        Self {
            zone_id: zone_id.into(),
            name: ensure_fqdn(name.as_ref()),
            ttl: DEFAULT_TTL_SECS,
        }
    }

    /// Set the record TTL
    pub fn with_ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate the record configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("Hosted zone ID cannot be empty"));
        }
        if !self.name.ends_with('.') {
            return Err(crate::Error::config(format!(
                "Record name must be fully qualified: {}",
                self.name
            )));
        }
        if self.ttl == 0 {
            return Err(crate::Error::config("Record TTL must be > 0"));
        }
        validate_record_name(&self.name)
    }
}

fn default_ttl() -> u32 {
    DEFAULT_TTL_SECS
}

/// Canonical record name: lowercase, with the root dot appended if missing
pub fn ensure_fqdn(name: &str) -> String {
    let name = name.trim().to_ascii_lowercase();
    if name.ends_with('.') {
        name
    } else {
        format!("{}.", name)
    }
}

/// Parse a TTL setting, falling back to [`DEFAULT_TTL_SECS`]
///
/// Unset, empty, zero and unparseable values all yield the default.
pub fn parse_ttl(raw: Option<&str>) -> u32 {
    raw.and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|ttl| *ttl > 0)
        .unwrap_or(DEFAULT_TTL_SECS)
}

/// Validate that a string is a valid domain name
///
/// Basic RFC 1035 checks on total length and on each label. The root dot
/// of a fully-qualified name is accepted.
pub fn validate_record_name(name: &str) -> Result<(), crate::Error> {
    let domain = name.strip_suffix('.').unwrap_or(name);

    if domain.is_empty() {
        return Err(crate::Error::config("Record name cannot be empty"));
    }

    // Total length limit (RFC 1035: 253 chars max)
    if domain.len() > 253 {
        return Err(crate::Error::config(format!(
            "Record name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        )));
    }

    for label in domain.split('.') {
        if label.is_empty() {
            return Err(crate::Error::config(format!(
                "Record name has empty label: '{}'",
                name
            )));
        }

        if label.len() > 63 {
            return Err(crate::Error::config(format!(
                "Record label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            )));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(crate::Error::config(format!(
                "Record label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            )));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(crate::Error::config(format!(
                "Record label cannot start or end with hyphen. Label: '{}'",
                label
            )));
        }
    }

    Ok(())
}

/// DNS record type
///
/// Only address records are managed; the type follows the caller's address family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    /// A record (IPv4)
    #[serde(rename = "A")]
    A,
    /// AAAA record (IPv6)
    #[serde(rename = "AAAA")]
    Aaaa,
}

impl RecordType {
    /// Record type for an address
    pub fn for_ip(ip: &IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => RecordType::A,
            IpAddr::V6(_) => RecordType::Aaaa,
        }
    }

    /// Wire name of the record type
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" => Ok(RecordType::A),
            "AAAA" => Ok(RecordType::Aaaa),
            other => Err(crate::Error::invalid_input(format!(
                "Unsupported record type: {}",
                other
            ))),
        }
    }
}

/// DNS provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// Cloudflare provider
    Cloudflare {
        /// Cloudflare API token
        api_token: String,
        /// API base URL override (defaults to the public v4 endpoint)
        #[serde(default)]
        api_base: Option<String>,
        /// Perform reads but skip writes
        #[serde(default)]
        dry_run: bool,
    },

    /// In-memory provider (local runs and tests)
    Memory,
}

impl ProviderConfig {
    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::Cloudflare { api_token, .. } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config("Cloudflare API token cannot be empty"));
                }
                Ok(())
            }
            ProviderConfig::Memory => Ok(()),
        }
    }

    /// Get the provider type name
    pub fn type_name(&self) -> &'static str {
        match self {
            ProviderConfig::Cloudflare { .. } => "cloudflare",
            ProviderConfig::Memory => "memory",
        }
    }
}

/// Secret store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SecretStoreConfig {
    /// File-backed secret (the path is the secret locator)
    File {
        /// Path to the secret file
        path: String,
    },

    /// In-memory secret (not persistent)
    Memory {
        /// Initial secret value
        #[serde(default)]
        initial: String,
    },
}

impl SecretStoreConfig {
    /// Validate the secret store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            SecretStoreConfig::File { path } => {
                if path.trim().is_empty() {
                    return Err(crate::Error::config("Secret file path cannot be empty"));
                }
                Ok(())
            }
            SecretStoreConfig::Memory { .. } => Ok(()),
        }
    }

    /// Get the secret store type name
    pub fn type_name(&self) -> &'static str {
        match self {
            SecretStoreConfig::File { .. } => "file",
            SecretStoreConfig::Memory { .. } => "memory",
        }
    }
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        SecretStoreConfig::Memory {
            initial: String::new(),
        }
    }
}
