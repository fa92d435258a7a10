// # ddns-core
//
// Core library for the token-gated, single-record DDNS service.
//
// ## Architecture Overview
//
// Every update request runs through one short reconciliation chain:
// - **SecretCache**: Caches the shared token fetched from a `SecretStore` (30s expiry)
// - **Authenticator**: Extracts the caller's token and compares it (fail closed)
// - **AddressResolver**: Derives the caller's address and the record type (A / AAAA)
// - **DnsState**: Reads the managed record set and upserts it via a `DnsProvider`
// - **Reconciler**: Orchestrates the chain and produces one `UpdateResult`
// - **SecretRotator**: Separate path that replaces the shared token
// - **ProviderRegistry**: Plugin-based registry for DNS providers and secret stores
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from provider implementations
// 2. **Single Attempt**: One invocation is one attempt, no internal retry or backoff
// 3. **Plugin-Based**: Providers are registered dynamically, no hard-coded if-else
// 4. **Library-First**: All core functionality can be used as a library
// 5. **Idempotency**: A record that already holds the caller's address is never rewritten

pub mod auth;
pub mod config;
pub mod dns;
pub mod engine;
pub mod error;
pub mod registry;
pub mod request;
pub mod resolver;
pub mod rotator;
pub mod secret;
pub mod traits;

// Re-export core types for convenience
pub use auth::{AuthDecision, Authenticator, AuthorizerResponse};
pub use config::{DdnsConfig, ProviderConfig, RecordConfig, RecordType, SecretStoreConfig};
pub use dns::{DnsState, MemoryDnsProvider};
pub use engine::{Reconciler, UpdateResult, UpdateStatus};
pub use error::{Error, Result};
pub use registry::ProviderRegistry;
pub use request::UpdateRequest;
pub use resolver::{AddressResolver, CallerAddress};
pub use rotator::SecretRotator;
pub use secret::{FileSecretStore, MemorySecretStore, SecretCache};
pub use traits::{Clock, DnsProvider, SecretStore, SystemClock};
