// # ddnsd
//
// Integration layer for the token-gated DDNS service. All decisions are made
// in ddns-core; this crate wires configuration, providers and the HTTP
// surface together.
//
// - `config`: environment configuration
// - `http`: axum routes translating requests into `UpdateRequest`s
// - `service`: assembles the reconciler and runs scheduled rotation
// - `runtime`: exit codes, logging setup and shutdown signals

pub mod config;
pub mod http;
pub mod runtime;
pub mod service;

pub use config::{Config, RotateConfig};
pub use runtime::DdnsExitCode;
pub use service::Service;
