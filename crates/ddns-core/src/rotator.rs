// # Secret Rotator
//
// Replaces the shared token with a fresh random value.
//
// ## Token format
//
// 32 bytes from the operating system's random source, encoded as unpadded
// URL-safe base64 (43 characters). The encoding carries no `+`, `/` or `=`,
// so the token can be used in a header or a query parameter as-is.
//
// ## Caches
//
// Rotation does not reach into any running SecretCache. A running cache picks
// up the new value on its next refresh (at most 30s later) unless its owner
// calls `SecretCache::invalidate`.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{error, info};

use crate::error::{Error, Result};
use crate::traits::SecretStore;

/// Random bytes per generated token
pub const TOKEN_BYTES: usize = 32;

/// Source of random bytes for token generation
pub trait EntropySource: Send + Sync {
    /// Fill `buf` completely, or fail
    fn fill(&self, buf: &mut [u8]) -> Result<()>;
}

/// The operating system's cryptographically secure random source
#[derive(Debug, Clone, Copy, Default)]
pub struct OsEntropy;

impl EntropySource for OsEntropy {
    fn fill(&self, buf: &mut [u8]) -> Result<()> {
        OsRng
            .try_fill_bytes(buf)
            .map_err(|e| Error::random_source(e.to_string()))
    }
}

/// Generate a new token from `entropy`
pub fn generate_token(entropy: &dyn EntropySource) -> Result<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    entropy.fill(&mut bytes)?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Replaces the stored shared token
pub struct SecretRotator {
    store: Arc<dyn SecretStore>,
    entropy: Box<dyn EntropySource>,
}

impl SecretRotator {
    /// Rotator over `store` using the OS random source
    pub fn new(store: Arc<dyn SecretStore>) -> Self {
        Self::with_entropy(store, Box::new(OsEntropy))
    }

    /// Rotator with an explicit entropy source
    pub fn with_entropy(store: Arc<dyn SecretStore>, entropy: Box<dyn EntropySource>) -> Self {
        Self { store, entropy }
    }

    /// Generate and store a new token
    ///
    /// # Returns
    ///
    /// - `Ok(token)`: The token now held by the store
    /// - `Err(Error::RandomSource)`: No randomness; the store was not touched
    /// - `Err(Error::SecretWrite)`: The store rejected the write; the old token stays
    pub async fn rotate(&self) -> Result<String> {
        let token = generate_token(self.entropy.as_ref())?;

        self.store.put_secret(&token).await.map_err(|e| {
            error!("Failed to store rotated token in {}: {}", self.store.store_name(), e);
            match e {
                Error::SecretWrite(_) => e,
                other => Error::secret_write(other.to_string()),
            }
        })?;

        info!("Rotated shared token in {} store", self.store.store_name());
        Ok(token)
    }
}
