//! Service assembly
//!
//! Builds the reconciler and the secret cache it shares with the in-process
//! rotation schedule.

use anyhow::{Context, Result};
use ddns_core::config::DdnsConfig;
use ddns_core::traits::{DnsProvider, SecretStore};
use ddns_core::{ProviderRegistry, Reconciler, SecretCache, SecretRotator, SystemClock};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};

/// Registry with every provider compiled into this binary
pub fn registry() -> ProviderRegistry {
    let registry = ProviderRegistry::with_builtins();

    #[cfg(feature = "cloudflare")]
    {
        info!("Registering Cloudflare provider");
        ddns_provider_cloudflare::register(&registry);
    }

    registry
}

/// A wired reconciler plus the secret components around it
pub struct Service {
    reconciler: Arc<Reconciler>,
    cache: Arc<SecretCache>,
    store: Arc<dyn SecretStore>,
}

impl Service {
    /// Create every component named in `config` from `registry`
    pub fn from_config(config: &DdnsConfig, registry: &ProviderRegistry) -> Result<Self> {
        config.validate().context("Invalid DDNS configuration")?;

        let store = registry
            .create_secret_store(&config.secret_store)
            .context("Failed to create secret store")?;
        let provider: Arc<dyn DnsProvider> = Arc::from(
            registry
                .create_provider(&config.provider)
                .context("Failed to create DNS provider")?,
        );
        let cache = Arc::new(SecretCache::new(store.clone(), Arc::new(SystemClock)));

        info!(
            "Managing {} in zone {} via {} (ttl {}s, secret store: {})",
            config.record.name,
            config.record.zone_id,
            provider.provider_name(),
            config.record.ttl,
            store.store_name()
        );

        let reconciler = Reconciler::new(cache.clone(), provider, config.record.clone())?;

        Ok(Self {
            reconciler: Arc::new(reconciler),
            cache,
            store,
        })
    }

    pub fn reconciler(&self) -> Arc<Reconciler> {
        self.reconciler.clone()
    }

    /// Rotate the shared token and drop the cached copy
    pub async fn rotate_once(&self) -> Result<()> {
        SecretRotator::new(self.store.clone()).rotate().await?;
        self.cache.invalidate().await;
        Ok(())
    }

    /// Rotate every `period` until the runtime shuts down
    ///
    /// The first rotation happens one full period after startup.
    pub fn spawn_rotation(&self, period: Duration) -> JoinHandle<()> {
        let rotator = SecretRotator::new(self.store.clone());
        let cache = self.cache.clone();

        info!("Scheduled token rotation every {}s", period.as_secs());
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticker.tick().await;

            loop {
                ticker.tick().await;
                match rotator.rotate().await {
                    Ok(_) => cache.invalidate().await,
                    Err(e) => error!("Scheduled token rotation failed: {}", e),
                }
            }
        })
    }
}
