// # Secret Store Trait
//
// Defines the interface to the storage service holding the shared token.
//
// ## Purpose
//
// The secret store is the system of record for the token. The
// [`crate::SecretCache`] reads it at most once per expiry window; the
// [`crate::SecretRotator`] overwrites it.
//
// ## Implementations
//
// - File-based: [`crate::secret::FileSecretStore`]
// - In-memory: [`crate::secret::MemorySecretStore`]

use async_trait::async_trait;

/// Trait for secret store implementations
///
/// A store addresses exactly one secret (its locator is part of the store's
/// configuration).
///
/// # Thread Safety
///
/// All methods must be safe to call concurrently from multiple tasks.
///
/// # Security
///
/// Implementations must never log the secret value or expose it through `Debug`.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Read the current secret value
    ///
    /// The value is returned as stored; trimming is the caller's job.
    ///
    /// # Returns
    ///
    /// - `Ok(String)`: The stored value (possibly empty)
    /// - `Err(Error::SecretFetch)`: The store is unreachable or access was denied
    async fn get_secret(&self) -> Result<String, crate::Error>;

    /// Overwrite the current secret value unconditionally (last writer wins)
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The value was stored
    /// - `Err(Error::SecretWrite)`: The write failed
    async fn put_secret(&self, value: &str) -> Result<(), crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// Helper trait for constructing secret stores from configuration
pub trait SecretStoreFactory: Send + Sync {
    /// Create a SecretStore instance from configuration
    fn create(
        &self,
        config: &crate::config::SecretStoreConfig,
    ) -> Result<std::sync::Arc<dyn SecretStore>, crate::Error>;
}
