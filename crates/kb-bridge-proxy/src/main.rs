//! HTTP front end for the kb-bridge backend-for-frontend.
//!
//! This server:
//! - Logs the web client into the upstream indexing platform (one session per process)
//! - Lists files and folders of the configured cloud-storage connection
//! - Creates, syncs, lists and edits knowledge bases
//! - Translates soft upstream failures into HTTP error responses

use std::sync::Arc;

use axum::http::HeaderValue;
use clap::Parser;
use kb_bridge_core::Bridge;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod handlers;

use config::Config;
use handlers::{router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine; the environment may already be set
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Ok(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }

    let config = Config::parse();

    info!("Starting kb-bridge-proxy v{}", env!("CARGO_PKG_VERSION"));
    info!("  Host: {}", config.host);
    info!("  Port: {}", config.port);
    match &config.backend_url {
        Some(url) => info!("  Backend: {}", url),
        None => warn!("  Backend: not configured (set BACKEND_URL)"),
    }
    if config.supabase_url.is_none() || config.supabase_anon_key.is_none() {
        warn!("  Login: DISABLED until SUPABASE_URL and SUPABASE_ANON_KEY are set");
    }
    if config.connection_id.is_none() {
        warn!("  Connection: not configured (set CONNECTION_ID)");
    }

    let bridge = Bridge::new(config.upstream())?;
    let state = AppState {
        bridge: Arc::new(bridge),
    };

    // Configure CORS
    let origins = config
        .cors_origins
        .iter()
        .map(|o| o.trim())
        .filter(|o| !o.is_empty())
        .filter(|o| {
            // Credentialed CORS cannot use a wildcard origin
            if *o == "*" {
                warn!("Ignoring wildcard CORS origin; list origins explicitly");
            }
            *o != "*"
        })
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect::<Vec<_>>();
    info!("  CORS origins: {:?}", origins);

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request());

    // Build router
    let app = router(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    // Bind and serve
    let addr = format!("{}:{}", config.host, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Bridge proxy stopped");
    Ok(())
}

/// Resolves on the first stop request. A signal source that cannot be
/// installed is logged and left out instead of aborting the server.
async fn shutdown_signal() {
    let interrupt = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, stopping the bridge"),
            Err(e) => {
                warn!("Interrupt handling unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Termination requested, draining open requests");
            }
            Err(e) => {
                warn!("Termination signal unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = interrupt => {},
        _ = terminate => {},
    }
}
