// # Shared Secret Handling
//
// The shared token cache and the SecretStore implementations it reads from.

pub mod cache;
pub mod file;
pub mod memory;

pub use cache::{SECRET_CACHE_TTL_SECS, SecretCache, SharedToken};
pub use file::{FileSecretStore, FileSecretStoreFactory};
pub use memory::{MemorySecretStore, MemorySecretStoreFactory};
