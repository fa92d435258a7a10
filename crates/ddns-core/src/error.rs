//! Error types for the DDNS system
//!
//! This module defines all error types used throughout the crate.

use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS system
#[derive(Error, Debug)]
pub enum Error {
    /// The shared secret could not be read from the secret store
    #[error("Secret fetch failed: {0}")]
    SecretFetch(String),

    /// The shared secret could not be written to the secret store
    #[error("Secret write failed: {0}")]
    SecretWrite(String),

    /// The random source could not produce token bytes
    #[error("Random source failed: {0}")]
    RandomSource(String),

    /// No usable caller address could be determined
    #[error("No usable address: {0}")]
    NoUsableAddress(String),

    /// Reading the managed record from the DNS provider failed
    #[error("Upstream read failed: {0}")]
    UpstreamRead(String),

    /// Writing the managed record to the DNS provider failed
    #[error("Upstream write failed: {0}")]
    UpstreamWrite(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client errors (from provider APIs)
    #[error("HTTP error: {0}")]
    Http(String),

    /// Record or zone not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a secret fetch error
    pub fn secret_fetch(msg: impl Into<String>) -> Self {
        Self::SecretFetch(msg.into())
    }

    /// Create a secret write error
    pub fn secret_write(msg: impl Into<String>) -> Self {
        Self::SecretWrite(msg.into())
    }

    /// Create a random source error
    pub fn random_source(msg: impl Into<String>) -> Self {
        Self::RandomSource(msg.into())
    }

    /// Create a "no usable address" error
    pub fn no_usable_address(msg: impl Into<String>) -> Self {
        Self::NoUsableAddress(msg.into())
    }

    /// Create an upstream read error
    pub fn upstream_read(msg: impl Into<String>) -> Self {
        Self::UpstreamRead(msg.into())
    }

    /// Create an upstream write error
    pub fn upstream_write(msg: impl Into<String>) -> Self {
        Self::UpstreamWrite(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }
}
