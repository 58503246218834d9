//! # olympics-server
//!
//! HTTP backend for Self Olympics: visitors register a nationality, either by
//! presenting a zero-knowledge identity proof or by plain claim, and the
//! leaderboard ranks countries by registrations.
//!
//! This binary provides:
//! - **REST API** (axum) for registration, the leaderboard, the country
//!   directory and health checks
//! - **SQLite persistence** through a bounded connection pool
//! - **Proof verification** delegated to an external verification service

mod api;
mod config;
mod error;
mod registration;
mod verifier;

use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use olympics_shared::constants::APP_NAME;
use olympics_store::Pool;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::registration::Registrar;
use crate::verifier::{DisabledVerifier, IdentityVerifier, RemoteVerifier};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,olympics_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Opens the first connection and runs migrations before serving.
    let pool = Pool::open(&config.database_path, config.pool_size).await?;

    let verifier: Arc<dyn IdentityVerifier> = match &config.verifier_url {
        Some(url) => {
            info!(url = %url, scope = %config.self_scope, "Using remote proof verifier");
            Arc::new(RemoteVerifier::new(
                url.clone(),
                config.self_scope.clone(),
                config.self_endpoint.clone(),
                config.mock_passport,
                config.verifier_timeout,
            )?)
        }
        None => {
            warn!("SELF_VERIFIER_URL not set, identity proofs will be rejected");
            Arc::new(DisabledVerifier)
        }
    };

    if config.allow_unverified {
        warn!("Unverified registrations are enabled and cannot prevent double votes");
    }

    let registrar = Arc::new(Registrar::new(
        pool.clone(),
        verifier,
        config.allow_unverified,
    ));

    let app_state = AppState {
        pool: pool.clone(),
        registrar,
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                pool.close();
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    pool.close();
    Ok(())
}
