//! Caller address resolution
//!
//! The gateway-reported connection source is authoritative. Only when it is
//! absent or blank does the resolver fall back to the first entry of
//! `X-Forwarded-For`. The address family picks the record type.

use std::net::IpAddr;
use tracing::debug;

use crate::config::RecordType;
use crate::error::{Error, Result};
use crate::request::{FORWARDED_FOR_HEADER, UpdateRequest};

/// The caller's address and the record type it belongs in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerAddress {
    /// Parsed address
    pub ip: IpAddr,
    /// A for IPv4, AAAA for IPv6
    pub record_type: RecordType,
}

impl CallerAddress {
    /// Build from an address, folding IPv4-mapped IPv6 back to IPv4
    pub fn new(ip: IpAddr) -> Self {
        let ip = match ip {
            IpAddr::V6(v6) => v6.to_ipv4_mapped().map(IpAddr::V4).unwrap_or(ip),
            v4 => v4,
        };
        Self {
            ip,
            record_type: RecordType::for_ip(&ip),
        }
    }

    /// The record value this address is written as
    pub fn value(&self) -> String {
        self.ip.to_string()
    }
}

/// Determines the caller's address from gateway-supplied metadata
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AddressResolver {
    /// Create a resolver
    pub fn new() -> Self {
        Self
    }

    /// Resolve the caller's address and record type
    ///
    /// # Returns
    ///
    /// - `Ok(CallerAddress)`: A parseable IPv4 or IPv6 address
    /// - `Err(Error::NoUsableAddress)`: Nothing usable in the request
    pub fn resolve(&self, request: &UpdateRequest) -> Result<CallerAddress> {
        let raw = match request.source_ip().map(str::trim).filter(|s| !s.is_empty()) {
            Some(source) => source,
            None => {
                let forwarded = request
                    .header(FORWARDED_FOR_HEADER)
                    .and_then(|v| v.split(',').next())
                    .map(str::trim)
                    .unwrap_or_default();
                if !forwarded.is_empty() {
                    debug!("No source address from gateway, using X-Forwarded-For");
                }
                forwarded
            }
        };

        if raw.is_empty() {
            return Err(Error::no_usable_address("could not determine caller IP"));
        }

        raw.parse::<IpAddr>()
            .map(CallerAddress::new)
            .map_err(|_| Error::no_usable_address(format!("unparseable caller IP: {}", raw)))
    }
}
