//! Core traits for the DDNS system
//!
//! This module defines the abstract interfaces that all implementations must follow.
//!
//! - [`DnsProvider`]: Record-set listing and change batches at the DNS provider
//! - [`SecretStore`]: Read and overwrite the shared token
//! - [`Clock`]: Time source for the secret cache

pub mod clock;
pub mod dns_provider;
pub mod secret_store;

pub use clock::{Clock, SystemClock};
pub use dns_provider::{ChangeBatch, DnsProvider, DnsProviderFactory, RecordSet, RecordSetQuery};
pub use secret_store::{SecretStore, SecretStoreFactory};
