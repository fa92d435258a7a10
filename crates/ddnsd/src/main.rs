// # ddnsd - DDNS Daemon
//
// Thin integration layer: all DDNS logic lives in ddns-core.
//
// The ddnsd daemon is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering providers and secret stores
// 4. Serving the HTTP surface until SIGTERM/SIGINT
// 5. Optionally rotating the shared token on a schedule
//
// ## Configuration
//
// ### Record
// - `DDNS_HOSTED_ZONE_ID`: Zone containing the record (required)
// - `DDNS_RECORD_NAME`: Managed record (required; trailing dot optional)
// - `DDNS_TTL`: Record TTL in seconds (default 60)
//
// ### Shared token
// - `DDNS_SECRET_STORE_TYPE`: file, memory (default file)
// - `DDNS_SECRET_STORE_PATH`: Token file (for file store)
// - `DDNS_SHARED_TOKEN`: Initial token (for memory store)
// - `DDNS_ROTATE_INTERVAL_SECS`: Rotate the token in-process on this period
//
// ### DNS Provider
// - `DDNS_PROVIDER_TYPE`: cloudflare, memory (default cloudflare)
// - `DDNS_PROVIDER_API_TOKEN`: API token
// - `DDNS_PROVIDER_API_BASE`: API base URL override
// - `DDNS_MODE`: `dry-run` performs reads but skips writes
//
// ### HTTP
// - `DDNS_LISTEN_ADDR`: Bind address (default 127.0.0.1:8080)
// - `DDNS_REQUEST_TIMEOUT_SECS`: Per-request timeout (default 10)
// - `DDNS_IDENTITY_SOURCE_HEADERS`: Comma-separated identity-source headers
// - `DDNS_SOURCE_IP_HEADER`: Caller address header set by a trusted proxy
//
// ## Example
//
// ```bash
// export DDNS_HOSTED_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export DDNS_RECORD_NAME=home.example.com
// export DDNS_SECRET_STORE_PATH=/var/lib/ddns/token
// export DDNS_PROVIDER_API_TOKEN=your_token
//
// ddns-rotate > /dev/null
// ddnsd
// ```

use anyhow::Result;
use ddnsd::http::{AppState, RequestMapping, router};
use ddnsd::runtime::{init_tracing, wait_for_shutdown};
use ddnsd::service::{Service, registry};
use ddnsd::{Config, DdnsExitCode};
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::{error, info};

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    if let Err(e) = init_tracing(config.log_level()) {
        eprintln!("{}", e);
        return DdnsExitCode::ConfigError.into();
    }

    info!("Starting ddnsd daemon");

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(config)).into()
}

/// Run the daemon
async fn run_daemon(config: Config) -> DdnsExitCode {
    let registry = registry();
    let service = match Service::from_config(&config.to_ddns_config(), &registry) {
        Ok(service) => service,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let listener = match listen(&config).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Startup error: {:#}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let rotation = config
        .rotate_interval()
        .map(|period| service.spawn_rotation(period));

    let mapping = RequestMapping {
        identity_source_headers: config.identity_source_headers.clone(),
        source_ip_header: config.source_ip_header.clone(),
    };
    let app = router(
        AppState::new(service.reconciler(), mapping),
        config.request_timeout(),
    );

    let result = serve(listener, app).await;

    if let Some(rotation) = rotation {
        rotation.abort();
    }

    match result {
        Ok(()) => {
            info!("Shutting down daemon");
            DdnsExitCode::CleanShutdown
        }
        Err(e) => {
            error!("Daemon error: {:#}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

async fn listen(config: &Config) -> Result<tokio::net::TcpListener> {
    let addr = config.listen_addr()?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on {}", addr);
    Ok(listener)
}

/// Serve until a shutdown signal arrives
///
/// In-flight requests are drained; each is bounded by the request timeout.
async fn serve(listener: tokio::net::TcpListener, app: axum::Router) -> Result<()> {
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown error: {}", e),
        }
    })
    .await?;
    Ok(())
}
