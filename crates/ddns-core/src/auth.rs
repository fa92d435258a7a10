//! Shared-token authentication
//!
//! The caller's candidate token is taken from the first non-empty of:
//!
//! 1. the gateway's identity-source list (first non-blank entry)
//! 2. the `X-Token` header (any case)
//! 3. the `token` query parameter
//!
//! and compared with the trimmed token from the [`SecretCache`]. An empty
//! candidate never authorizes. If the secret cannot be read, the request is
//! denied.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::request::{TOKEN_HEADER, TOKEN_QUERY_PARAM, UpdateRequest};
use crate::secret::SecretCache;

/// Why a request was denied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No candidate token anywhere in the request
    MissingToken,
    /// A candidate was present but did not match
    TokenMismatch,
    /// The shared secret could not be read
    SecretUnavailable,
}

/// Outcome of an authorization attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    /// The candidate matched the shared token
    Granted,
    /// The request must be rejected
    Denied(DenyReason),
}

impl AuthDecision {
    /// Whether the request may proceed
    pub fn is_granted(&self) -> bool {
        matches!(self, AuthDecision::Granted)
    }
}

/// Response of the standalone authorization check (gateway auth hook)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorizerResponse {
    /// Whether the gateway should let the request through
    #[serde(rename = "isAuthorized")]
    pub is_authorized: bool,
    /// Free-form context handed back to the gateway
    pub context: BTreeMap<String, Value>,
}

/// Extract the candidate token from a request
///
/// Returns the first non-empty trimmed value in priority order, or `None`.
pub fn extract_candidate(request: &UpdateRequest) -> Option<String> {
    let from_identity = request
        .identity_source()
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty());

    from_identity
        .or_else(|| {
            request
                .header(TOKEN_HEADER)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .or_else(|| {
            request
                .query(TOKEN_QUERY_PARAM)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
        .map(str::to_string)
}

/// Compare a candidate with the expected token
///
/// Exact equality after trimming both sides, compared with
/// [`ConstantTimeEq`]. An empty candidate never matches, even when the
/// expected token is empty too.
pub fn tokens_match(candidate: &str, want: &str) -> bool {
    let candidate = candidate.trim().as_bytes();
    if candidate.is_empty() {
        return false;
    }

    candidate.ct_eq(want.trim().as_bytes()).into()
}

/// Whether `request` carries a token equal to `want`
pub fn authorize_against(request: &UpdateRequest, want: &str) -> bool {
    extract_candidate(request).is_some_and(|candidate| tokens_match(&candidate, want))
}

/// Authenticates requests against the cached shared token
pub struct Authenticator {
    cache: Arc<SecretCache>,
}

impl Authenticator {
    /// Create an authenticator over a shared cache
    pub fn new(cache: Arc<SecretCache>) -> Self {
        Self { cache }
    }

    /// The cache this authenticator reads
    pub fn cache(&self) -> &Arc<SecretCache> {
        &self.cache
    }

    /// Decide whether `request` is authorized
    ///
    /// Fails closed: a secret fetch failure is a denial. The secret is read
    /// before the request is inspected, so an unreadable store is reported
    /// as such even when no token was presented.
    pub async fn authorize(&self, request: &UpdateRequest) -> AuthDecision {
        let want = match self.cache.get().await {
            Ok(want) => want,
            Err(e) => {
                warn!("Denying request, shared token unavailable: {}", e);
                return AuthDecision::Denied(DenyReason::SecretUnavailable);
            }
        };

        let Some(candidate) = extract_candidate(request) else {
            debug!("No token presented");
            return AuthDecision::Denied(DenyReason::MissingToken);
        };

        if tokens_match(&candidate, &want) {
            AuthDecision::Granted
        } else {
            debug!("Presented token does not match");
            AuthDecision::Denied(DenyReason::TokenMismatch)
        }
    }

    /// Standalone authorization check for a gateway auth hook
    ///
    /// Same decision as [`Authenticator::authorize`], without any DNS work.
    pub async fn check(&self, request: &UpdateRequest) -> AuthorizerResponse {
        let decision = self.authorize(request).await;

        let mut context = BTreeMap::new();
        match decision {
            AuthDecision::Denied(DenyReason::SecretUnavailable) => {
                context.insert(
                    "reason".to_string(),
                    Value::String("secret_fetch_failed".to_string()),
                );
            }
            _ => {
                context.insert("auth".to_string(), Value::String("token".to_string()));
            }
        }

        AuthorizerResponse {
            is_authorized: decision.is_granted(),
            context,
        }
    }
}
