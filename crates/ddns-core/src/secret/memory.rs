// # Memory Secret Store
//
// In-memory implementation of SecretStore.
//
// ## Purpose
//
// Holds the shared token in process memory. Useful for tests and for local
// runs where the token is handed in through the environment.
//
// ## Crash Behavior
//
// - A rotated token is lost on restart; the store comes back with its initial value

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::Error;
use crate::config::SecretStoreConfig;
use crate::traits::{SecretStore, SecretStoreFactory};

/// In-memory secret store implementation
///
/// Clones share the same underlying value.
#[derive(Clone)]
pub struct MemorySecretStore {
    inner: Arc<RwLock<String>>,
}

impl MemorySecretStore {
    /// Create a store holding `initial`
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(initial.into())),
        }
    }
}

impl Default for MemorySecretStore {
    fn default() -> Self {
        Self::new(String::new())
    }
}

impl std::fmt::Debug for MemorySecretStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemorySecretStore")
            .field("value", &"<REDACTED>")
            .finish()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret(&self) -> Result<String, Error> {
        Ok(self.inner.read().await.clone())
    }

    async fn put_secret(&self, value: &str) -> Result<(), Error> {
        let mut guard = self.inner.write().await;
        *guard = value.to_string();
        Ok(())
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Factory for [`MemorySecretStore`]
pub struct MemorySecretStoreFactory;

impl SecretStoreFactory for MemorySecretStoreFactory {
    fn create(&self, config: &SecretStoreConfig) -> Result<Arc<dyn SecretStore>, Error> {
        match config {
            SecretStoreConfig::Memory { initial } => {
                Ok(Arc::new(MemorySecretStore::new(initial.clone())))
            }
            _ => Err(Error::config("Invalid config for memory secret store")),
        }
    }
}
