//! Update reconciliation
//!
//! The Reconciler is responsible for:
//! - Gating every request on the shared token
//! - Resolving the caller's address and record type
//! - Reading the record's current value
//! - Writing the record only when it differs
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐  denied   ┌──────────────┐
//! │Authenticate │──────────▶│ Unauthorized │
//! └─────────────┘           └──────────────┘
//!        │ granted
//!        ▼
//! ┌─────────────┐  none     ┌──────────────┐
//! │  Resolve    │──────────▶│  BadRequest  │
//! └─────────────┘           └──────────────┘
//!        │
//!        ▼
//! ┌─────────────┐  error    ┌──────────────┐
//! │    Read     │──────────▶│UpstreamError │
//! └─────────────┘           └──────────────┘
//!        │
//!        ├── equal ───────▶ NoChange
//!        ▼
//! ┌─────────────┐  error
//! │   Write     │──────────▶ UpstreamError
//! └─────────────┘
//!        │
//!        ▼
//!     Updated
//! ```
//!
//! One invocation is one attempt. Failures are reported in the result and
//! never retried here.

mod outcome;

pub use outcome::{ResponseBody, UNAUTHORIZED_MESSAGE, UpdateResult, UpdateStatus};

use std::fmt;
use std::sync::Arc;
use tracing::{debug, error, info, trace};

use crate::auth::Authenticator;
use crate::config::RecordConfig;
use crate::dns::DnsState;
use crate::error::Result;
use crate::request::UpdateRequest;
use crate::resolver::AddressResolver;
use crate::secret::SecretCache;
use crate::traits::DnsProvider;

/// Position of a reconciliation in its flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Start,
    Authenticating,
    Resolving,
    Reading,
    Deciding,
    NoOp,
    Writing,
    Done(UpdateStatus),
}

/// Runs one update request to a single [`UpdateResult`]
///
/// ## Concurrency
///
/// `reconcile` takes `&self`; any number of requests may run at once. Two
/// concurrent requests for the same record may both read, decide and write.
/// The provider's upsert makes the last write win.
pub struct Reconciler {
    authenticator: Authenticator,
    resolver: AddressResolver,
    dns: DnsState,
    record: RecordConfig,
}

impl Reconciler {
    /// Create a reconciler for `record`
    ///
    /// # Returns
    ///
    /// - `Ok(Reconciler)`: Ready to serve requests
    /// - `Err(Error::Config)`: The record configuration is invalid
    pub fn new(
        cache: Arc<SecretCache>,
        provider: Arc<dyn DnsProvider>,
        record: RecordConfig,
    ) -> Result<Self> {
        record.validate()?;

        Ok(Self {
            authenticator: Authenticator::new(cache),
            resolver: AddressResolver::new(),
            dns: DnsState::new(provider),
            record,
        })
    }

    /// The managed record
    pub fn record(&self) -> &RecordConfig {
        &self.record
    }

    /// The authenticator gating this reconciler
    pub fn authenticator(&self) -> &Authenticator {
        &self.authenticator
    }

    fn enter(&self, state: ReconcileState) {
        trace!(record = %self.record.name, ?state, "reconcile");
    }

    /// Reconcile the managed record with the caller's address
    ///
    /// Never fails: every outcome, including upstream errors, is a result.
    pub async fn reconcile(&self, request: &UpdateRequest) -> UpdateResult {
        let result = self.run(request).await;
        self.enter(ReconcileState::Done(result.status));
        result
    }

    async fn run(&self, request: &UpdateRequest) -> UpdateResult {
        let RecordConfig {
            zone_id: zone,
            name,
            ttl,
        } = &self.record;
        let ttl = *ttl;

        self.enter(ReconcileState::Start);

        self.enter(ReconcileState::Authenticating);
        let decision = self.authenticator.authorize(request).await;
        if !decision.is_granted() {
            debug!("Rejecting update for {}: {:?}", name, decision);
            return UpdateResult::unauthorized(name, ttl);
        }

        self.enter(ReconcileState::Resolving);
        let caller = match self.resolver.resolve(request) {
            Ok(caller) => caller,
            Err(e) => {
                debug!("Rejecting update for {}: {}", name, e);
                return UpdateResult::bad_request(name, ttl, e.to_string());
            }
        };
        let record_type = caller.record_type;
        let new_value = caller.value();

        self.enter(ReconcileState::Reading);
        let current = match self.dns.current_value(zone, name, record_type).await {
            Ok(current) => current,
            Err(e) => {
                error!("Failed to read {} {}: {}", name, record_type, e);
                return UpdateResult::upstream_error(name, Some(record_type), ttl, e.to_string());
            }
        };

        self.enter(ReconcileState::Deciding);
        if current.as_deref() == Some(new_value.as_str()) {
            self.enter(ReconcileState::NoOp);
            debug!("{} {} already at {}, nothing to do", name, record_type, new_value);
            return UpdateResult::no_change(name, record_type, &new_value, ttl);
        }

        self.enter(ReconcileState::Writing);
        if let Err(e) = self
            .dns
            .upsert(zone, name, record_type, &new_value, ttl)
            .await
        {
            error!("Failed to update {} {}: {}", name, record_type, e);
            return UpdateResult::upstream_error(name, Some(record_type), ttl, e.to_string());
        }

        info!(
            "Updated {} {} {} -> {}",
            name,
            record_type,
            current.as_deref().unwrap_or("(none)"),
            new_value
        );
        UpdateResult::updated(name, record_type, current, &new_value, ttl)
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("record", &self.record)
            .field("provider", &self.dns.provider_name())
            .finish_non_exhaustive()
    }
}
