//! HTTP surface
//!
//! | route          | methods   | handler                          |
//! |----------------|-----------|----------------------------------|
//! | `/update`      | GET, POST | reconcile the managed record     |
//! | `/authorize`   | GET, POST | standalone token check, always 200 |
//! | `/healthcheck` | GET       | liveness                         |
//!
//! Requests are translated into a transport-neutral `UpdateRequest`; no
//! decision is made here.

use axum::Json;
use axum::Router;
use axum::extract::{ConnectInfo, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use ddns_core::{AuthorizerResponse, Reconciler, UpdateRequest};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

/// How requests are mapped onto an `UpdateRequest`
#[derive(Debug, Clone, Default)]
pub struct RequestMapping {
    /// Headers whose values form the identity-source list, in order
    pub identity_source_headers: Vec<String>,
    /// Header carrying the caller address when behind a trusted proxy
    pub source_ip_header: Option<String>,
}

impl RequestMapping {
    /// Build the transport-neutral request
    ///
    /// The source address is the configured header when set, otherwise the
    /// socket peer.
    pub fn to_update_request(
        &self,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        peer: Option<SocketAddr>,
    ) -> UpdateRequest {
        let mut request = UpdateRequest::new();

        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                request.insert_header(name.as_str(), value);
            }
        }

        for (name, value) in query {
            request = request.with_query(name, value);
        }

        let identity: Vec<String> = self
            .identity_source_headers
            .iter()
            .filter_map(|name| headers.get(name.as_str()))
            .filter_map(|value| value.to_str().ok())
            .map(str::to_string)
            .collect();
        request = request.with_identity_source(identity);

        let source = match &self.source_ip_header {
            Some(name) => headers
                .get(name.as_str())
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
            None => peer.map(|addr| addr.ip().to_string()),
        };
        if let Some(source) = source {
            request = request.with_source_ip(source);
        }

        request
    }
}

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    reconciler: Arc<Reconciler>,
    mapping: Arc<RequestMapping>,
}

impl AppState {
    pub fn new(reconciler: Arc<Reconciler>, mapping: RequestMapping) -> Self {
        Self {
            reconciler,
            mapping: Arc::new(mapping),
        }
    }

    fn update_request(
        &self,
        headers: &HeaderMap,
        query: HashMap<String, String>,
        peer: Option<ConnectInfo<SocketAddr>>,
    ) -> UpdateRequest {
        self.mapping
            .to_update_request(headers, query, peer.map(|ConnectInfo(addr)| addr))
    }
}

/// Build the router
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    Router::new()
        .route("/update", get(update).post(update))
        .route("/authorize", get(authorize).post(authorize))
        .route("/healthcheck", get(healthcheck))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn update(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let request = state.update_request(&headers, query, peer);
    let result = state.reconciler.reconcile(&request).await;

    let status =
        StatusCode::from_u16(result.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(result.body())).into_response()
}

async fn authorize(
    State(state): State<AppState>,
    peer: Option<ConnectInfo<SocketAddr>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Json<AuthorizerResponse> {
    let request = state.update_request(&headers, query, peer);
    Json(state.reconciler.authenticator().check(&request).await)
}

async fn healthcheck() -> Json<Value> {
    Json(json!({ "ok": "healthy" }))
}
