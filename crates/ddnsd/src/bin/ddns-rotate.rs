// # ddns-rotate
//
// Replaces the shared token in the file secret store and prints the new
// token on stdout. Logs go to stderr.
//
// ## Configuration
//
// - `DDNS_SECRET_STORE_TYPE`: must be `file` (default)
// - `DDNS_SECRET_STORE_PATH`: Token file
// - `DDNS_LOG_LEVEL`: Log level (default info)
//
// A running ddnsd picks up the new token within 30 seconds.

use ddns_core::SecretRotator;
use ddnsd::runtime::init_tracing;
use ddnsd::service::registry;
use ddnsd::{DdnsExitCode, RotateConfig};
use std::process::ExitCode;
use tracing::error;

fn main() -> ExitCode {
    let config = match RotateConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(config.log_level()) {
        eprintln!("{}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let store = match registry().create_secret_store(&config.secret_store_config()) {
        Ok(store) => store,
        Err(e) => {
            error!("Failed to create secret store: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    match rt.block_on(SecretRotator::new(store).rotate()) {
        Ok(token) => {
            println!("{}", token);
            DdnsExitCode::CleanShutdown.into()
        }
        Err(e) => {
            error!("Token rotation failed: {}", e);
            DdnsExitCode::RuntimeError.into()
        }
    }
}
