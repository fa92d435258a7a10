//! Environment configuration
//!
//! Configuration is read from environment variables only. Lookups go through
//! a closure so tests never touch the process environment.

use anyhow::{Context, Result, bail};
use ddns_core::config::{
    DdnsConfig, ProviderConfig, RecordConfig, SecretStoreConfig, ensure_fqdn, parse_ttl,
    validate_record_name,
};
use std::env;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::Level;

/// Default HTTP bind address
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";

/// Default per-request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Shortest accepted rotation period in seconds
pub const MIN_ROTATE_INTERVAL_SECS: u64 = 60;

/// Daemon configuration
#[derive(Clone)]
pub struct Config {
    pub hosted_zone_id: String,
    pub record_name: String,
    pub ttl: u32,
    pub secret_store_type: String,
    pub secret_store_path: Option<String>,
    /// Initial secret for the memory store
    /// ⚠️ NEVER log this value
    pub shared_token: String,
    pub provider_type: String,
    /// ⚠️ NEVER log this value
    pub provider_api_token: Option<String>,
    pub provider_api_base: Option<String>,
    pub listen_addr: String,
    pub request_timeout_secs: u64,
    pub identity_source_headers: Vec<String>,
    pub source_ip_header: Option<String>,
    pub rotate_interval_secs: Option<u64>,
    pub dry_run: bool,
    pub log_level: String,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("hosted_zone_id", &self.hosted_zone_id)
            .field("record_name", &self.record_name)
            .field("ttl", &self.ttl)
            .field("secret_store_type", &self.secret_store_type)
            .field("secret_store_path", &self.secret_store_path)
            .field("shared_token", &"<REDACTED>")
            .field("provider_type", &self.provider_type)
            .field("provider_api_token", &"<REDACTED>")
            .field("provider_api_base", &self.provider_api_base)
            .field("listen_addr", &self.listen_addr)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("identity_source_headers", &self.identity_source_headers)
            .field("source_ip_header", &self.source_ip_header)
            .field("rotate_interval_secs", &self.rotate_interval_secs)
            .field("dry_run", &self.dry_run)
            .field("log_level", &self.log_level)
            .finish()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_mode(raw: Option<String>) -> Result<bool> {
    match non_empty(raw).map(|m| m.to_lowercase()).as_deref() {
        None | Some("live") => Ok(false),
        Some("dry-run") => Ok(true),
        Some(other) => bail!(
            "DDNS_MODE '{}' is not valid. Valid modes: live, dry-run",
            other
        ),
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));

        let request_timeout_secs = match get("DDNS_REQUEST_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("DDNS_REQUEST_TIMEOUT_SECS is not a number: {}", raw))?,
            None => DEFAULT_REQUEST_TIMEOUT_SECS,
        };

        let rotate_interval_secs = get("DDNS_ROTATE_INTERVAL_SECS")
            .map(|raw| {
                raw.parse::<u64>()
                    .with_context(|| format!("DDNS_ROTATE_INTERVAL_SECS is not a number: {}", raw))
            })
            .transpose()?;

        Ok(Self {
            hosted_zone_id: get("DDNS_HOSTED_ZONE_ID").unwrap_or_default(),
            record_name: get("DDNS_RECORD_NAME").unwrap_or_default(),
            ttl: parse_ttl(lookup("DDNS_TTL").as_deref()),
            secret_store_type: get("DDNS_SECRET_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            secret_store_path: get("DDNS_SECRET_STORE_PATH"),
            shared_token: lookup("DDNS_SHARED_TOKEN").unwrap_or_default(),
            provider_type: get("DDNS_PROVIDER_TYPE").unwrap_or_else(|| "cloudflare".to_string()),
            provider_api_token: get("DDNS_PROVIDER_API_TOKEN"),
            provider_api_base: get("DDNS_PROVIDER_API_BASE"),
            listen_addr: get("DDNS_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string()),
            request_timeout_secs,
            identity_source_headers: get("DDNS_IDENTITY_SOURCE_HEADERS")
                .unwrap_or_default()
                .split(',')
                .map(|s| s.trim().to_ascii_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            source_ip_header: get("DDNS_SOURCE_IP_HEADER").map(|h| h.to_ascii_lowercase()),
            rotate_interval_secs,
            dry_run: parse_mode(lookup("DDNS_MODE"))?,
            log_level: get("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.hosted_zone_id.is_empty() {
            bail!(
                "DDNS_HOSTED_ZONE_ID is required. \
                Set it via: export DDNS_HOSTED_ZONE_ID=your_zone_id"
            );
        }

        if self.record_name.is_empty() {
            bail!(
                "DDNS_RECORD_NAME is required. \
                Set it via: export DDNS_RECORD_NAME=home.example.com"
            );
        }
        validate_record_name(&ensure_fqdn(&self.record_name))
            .map_err(|e| anyhow::anyhow!("DDNS_RECORD_NAME is invalid: {}", e))?;

        match self.secret_store_type.as_str() {
            "file" => {
                if self.secret_store_path.is_none() {
                    bail!(
                        "DDNS_SECRET_STORE_PATH is required when DDNS_SECRET_STORE_TYPE=file. \
                        Set it via: export DDNS_SECRET_STORE_PATH=/var/lib/ddns/token"
                    );
                }
            }
            "memory" => {}
            other => bail!(
                "DDNS_SECRET_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory",
                other
            ),
        }

        match self.provider_type.as_str() {
            "cloudflare" => {
                let Some(token) = &self.provider_api_token else {
                    bail!(
                        "DDNS_PROVIDER_API_TOKEN is required when DDNS_PROVIDER_TYPE=cloudflare. \
                        Set it via: export DDNS_PROVIDER_API_TOKEN=your_token"
                    );
                };

                let token_lower = token.to_lowercase();
                if token_lower.contains("your_token")
                    || token_lower.contains("replace_me")
                    || token_lower == "token"
                {
                    bail!(
                        "DDNS_PROVIDER_API_TOKEN appears to be a placeholder. \
                        Use an actual API token from your DNS provider."
                    );
                }

                if let Some(base) = &self.provider_api_base
                    && !base.starts_with("https://")
                    && !base.starts_with("http://")
                {
                    bail!(
                        "DDNS_PROVIDER_API_BASE must use HTTP or HTTPS scheme. Got: {}",
                        base
                    );
                }
            }
            "memory" => {}
            other => bail!(
                "DDNS_PROVIDER_TYPE '{}' is not supported. \
                Supported providers: cloudflare, memory",
                other
            ),
        }

        self.listen_addr()?;

        if !(1..=300).contains(&self.request_timeout_secs) {
            bail!(
                "DDNS_REQUEST_TIMEOUT_SECS must be between 1 and 300 seconds. Got: {}",
                self.request_timeout_secs
            );
        }

        if let Some(interval) = self.rotate_interval_secs
            && interval < MIN_ROTATE_INTERVAL_SECS
        {
            bail!(
                "DDNS_ROTATE_INTERVAL_SECS must be at least {} seconds. Got: {}",
                MIN_ROTATE_INTERVAL_SECS,
                interval
            );
        }

        parse_log_level(&self.log_level)?;

        Ok(())
    }

    /// Parsed bind address
    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen_addr
            .parse()
            .with_context(|| format!("DDNS_LISTEN_ADDR is not a socket address: {}", self.listen_addr))
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Rotation period, if scheduled rotation is enabled
    pub fn rotate_interval(&self) -> Option<Duration> {
        self.rotate_interval_secs.map(Duration::from_secs)
    }

    /// Tracing level, defaulting to INFO
    pub fn log_level(&self) -> Level {
        parse_log_level(&self.log_level).unwrap_or(Level::INFO)
    }

    /// Secret store section of the core configuration
    pub fn secret_store_config(&self) -> SecretStoreConfig {
        match self.secret_store_type.as_str() {
            "memory" => SecretStoreConfig::Memory {
                initial: self.shared_token.clone(),
            },
            _ => SecretStoreConfig::File {
                path: self.secret_store_path.clone().unwrap_or_default(),
            },
        }
    }

    /// Core configuration for the reconciler and its collaborators
    pub fn to_ddns_config(&self) -> DdnsConfig {
        let provider = match self.provider_type.as_str() {
            "memory" => ProviderConfig::Memory,
            _ => ProviderConfig::Cloudflare {
                api_token: self.provider_api_token.clone().unwrap_or_default(),
                api_base: self.provider_api_base.clone(),
                dry_run: self.dry_run,
            },
        };

        DdnsConfig::new(
            RecordConfig::new(self.hosted_zone_id.clone(), &self.record_name).with_ttl(self.ttl),
            provider,
            self.secret_store_config(),
        )
    }
}

/// Parse a `DDNS_LOG_LEVEL` value
pub fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            raw
        ),
    }
}

/// Configuration of the `ddns-rotate` tool
#[derive(Debug, Clone)]
pub struct RotateConfig {
    pub secret_store_type: String,
    pub secret_store_path: Option<String>,
    pub log_level: String,
}

impl RotateConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through `lookup`
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| non_empty(lookup(key));
        let config = Self {
            secret_store_type: get("DDNS_SECRET_STORE_TYPE").unwrap_or_else(|| "file".to_string()),
            secret_store_path: get("DDNS_SECRET_STORE_PATH"),
            log_level: get("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.secret_store_type != "file" {
            bail!(
                "ddns-rotate only supports DDNS_SECRET_STORE_TYPE=file. Got: {}",
                self.secret_store_type
            );
        }
        if self.secret_store_path.is_none() {
            bail!(
                "DDNS_SECRET_STORE_PATH is required. \
                Set it via: export DDNS_SECRET_STORE_PATH=/var/lib/ddns/token"
            );
        }
        parse_log_level(&self.log_level)?;
        Ok(())
    }

    /// Tracing level, defaulting to INFO
    pub fn log_level(&self) -> Level {
        parse_log_level(&self.log_level).unwrap_or(Level::INFO)
    }

    /// Secret store section of the core configuration
    pub fn secret_store_config(&self) -> SecretStoreConfig {
        SecretStoreConfig::File {
            path: self.secret_store_path.clone().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    fn minimal() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DDNS_HOSTED_ZONE_ID", "Z123"),
            ("DDNS_RECORD_NAME", "home.example.com"),
            ("DDNS_SECRET_STORE_PATH", "/var/lib/ddns/token"),
            ("DDNS_PROVIDER_API_TOKEN", "cf-0123456789abcdef"),
        ]
    }

    fn with(extra: &[(&'static str, &'static str)]) -> Result<Config> {
        let mut pairs = minimal();
        pairs.retain(|(k, _)| !extra.iter().any(|(ek, _)| ek == k));
        pairs.extend_from_slice(extra);
        Config::from_lookup(lookup(&pairs))
    }

    #[test]
    fn defaults_apply() {
        let config = with(&[]).unwrap();
        config.validate().unwrap();

        assert_eq!(config.ttl, 60);
        assert_eq!(config.secret_store_type, "file");
        assert_eq!(config.provider_type, "cloudflare");
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.rotate_interval(), None);
        assert!(!config.dry_run);
        assert_eq!(config.log_level(), Level::INFO);
    }

    #[test]
    fn garbage_ttl_falls_back() {
        assert_eq!(with(&[("DDNS_TTL", "soon")]).unwrap().ttl, 60);
        assert_eq!(with(&[("DDNS_TTL", "300")]).unwrap().ttl, 300);
    }

    #[test]
    fn missing_zone_is_rejected() {
        let config = with(&[("DDNS_HOSTED_ZONE_ID", " ")]).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("DDNS_HOSTED_ZONE_ID"));
    }

    #[test]
    fn invalid_record_name_is_rejected() {
        let config = with(&[("DDNS_RECORD_NAME", "bad_name.example.com")]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn file_store_requires_path() {
        let config = with(&[("DDNS_SECRET_STORE_PATH", "")]).unwrap();
        assert!(config.validate().is_err());

        let config = with(&[("DDNS_SECRET_STORE_PATH", ""), ("DDNS_SECRET_STORE_TYPE", "memory")])
            .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn cloudflare_requires_real_token() {
        let config = with(&[("DDNS_PROVIDER_API_TOKEN", "")]).unwrap();
        assert!(config.validate().is_err());

        let config = with(&[("DDNS_PROVIDER_API_TOKEN", "REPLACE_ME")]).unwrap();
        assert!(config.validate().is_err());

        let config = with(&[("DDNS_PROVIDER_API_TOKEN", ""), ("DDNS_PROVIDER_TYPE", "memory")])
            .unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn unknown_mode_is_rejected() {
        assert!(with(&[("DDNS_MODE", "yolo")]).is_err());
        assert!(with(&[("DDNS_MODE", "DRY-RUN")]).unwrap().dry_run);
    }

    #[test]
    fn numeric_ranges_are_checked() {
        assert!(with(&[("DDNS_REQUEST_TIMEOUT_SECS", "abc")]).is_err());
        assert!(
            with(&[("DDNS_REQUEST_TIMEOUT_SECS", "0")])
                .unwrap()
                .validate()
                .is_err()
        );
        assert!(
            with(&[("DDNS_ROTATE_INTERVAL_SECS", "5")])
                .unwrap()
                .validate()
                .is_err()
        );
        assert!(with(&[("DDNS_LISTEN_ADDR", "localhost")]).unwrap().validate().is_err());
    }

    #[test]
    fn identity_headers_are_normalized() {
        let config = with(&[("DDNS_IDENTITY_SOURCE_HEADERS", " Authorization, ,X-Api-Key ")])
            .unwrap();
        assert_eq!(config.identity_source_headers, vec!["authorization", "x-api-key"]);
    }

    #[test]
    fn to_ddns_config_carries_settings() {
        let config = with(&[("DDNS_MODE", "dry-run"), ("DDNS_TTL", "120")]).unwrap();
        let ddns = config.to_ddns_config();

        assert_eq!(ddns.record.name, "home.example.com.");
        assert_eq!(ddns.record.ttl, 120);
        assert!(matches!(
            ddns.provider,
            ProviderConfig::Cloudflare { dry_run: true, .. }
        ));
        assert!(matches!(ddns.secret_store, SecretStoreConfig::File { .. }));
        ddns.validate().unwrap();
    }

    #[test]
    fn debug_redacts_tokens() {
        let config = with(&[
            ("DDNS_SECRET_STORE_TYPE", "memory"),
            ("DDNS_SHARED_TOKEN", "shared-secret-value"),
        ])
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("shared-secret-value"));
        assert!(!rendered.contains("cf-0123456789abcdef"));
    }

    #[test]
    fn rotate_config_requires_file_store() {
        assert!(RotateConfig::from_lookup(lookup(&[("DDNS_SECRET_STORE_TYPE", "memory")])).is_err());
        assert!(RotateConfig::from_lookup(lookup(&[])).is_err());

        let config =
            RotateConfig::from_lookup(lookup(&[("DDNS_SECRET_STORE_PATH", "/tmp/token")])).unwrap();
        assert!(matches!(
            config.secret_store_config(),
            SecretStoreConfig::File { path } if path == "/tmp/token"
        ));
    }
}
