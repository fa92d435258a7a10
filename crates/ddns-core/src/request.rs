//! Gateway-neutral view of an inbound update request
//!
//! The request gateway (the daemon's HTTP front, or any other host) parses
//! the inbound call and hands over only what the reconciler needs: headers,
//! query parameters, the gateway's identity-source list and the connection
//! source address.

use std::collections::HashMap;

/// Header carrying the caller's token
pub const TOKEN_HEADER: &str = "x-token";

/// Query parameter carrying the caller's token
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Header carrying the proxy chain of client addresses
pub const FORWARDED_FOR_HEADER: &str = "x-forwarded-for";

/// One inbound update (or authorization-check) request
///
/// Header names are matched case-insensitively; query parameter names are
/// matched exactly.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    headers: HashMap<String, String>,
    query: HashMap<String, String>,
    identity_source: Vec<String>,
    source_ip: Option<String>,
}

impl UpdateRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a header (name is case-insensitive)
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    /// Add a query parameter
    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(name.into(), value.into());
        self
    }

    /// Set the gateway-provided identity-source list
    pub fn with_identity_source<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.identity_source = values.into_iter().map(Into::into).collect();
        self
    }

    /// Set the gateway-reported connection source address
    pub fn with_source_ip(mut self, source_ip: impl Into<String>) -> Self {
        self.source_ip = Some(source_ip.into());
        self
    }

    /// Insert a header in place
    ///
    /// Repeated header lines are joined with `", "` in arrival order, so the
    /// first list entry stays first.
    pub fn insert_header(&mut self, name: impl AsRef<str>, value: impl Into<String>) {
        let value = value.into();
        self.headers
            .entry(name.as_ref().to_ascii_lowercase())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(&value);
            })
            .or_insert(value);
    }

    /// Look up a header by case-insensitive name
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Look up a query parameter
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The gateway-provided identity-source list
    pub fn identity_source(&self) -> &[String] {
        &self.identity_source
    }

    /// The gateway-reported connection source address
    pub fn source_ip(&self) -> Option<&str> {
        self.source_ip.as_deref()
    }
}
