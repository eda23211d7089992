//! Incimap Server: session credentials and admission control for the
//! incident map.
//!
//! Main entry point that wires the crates together and starts the server.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tracing_subscriber::{EnvFilter, fmt};

use incimap_api::{AppState, build_router};
use incimap_auth::{AdmissionLimiter, CredentialIssuer, InMemorySubjectDirectory};
use incimap_core::config::AppConfig;
use incimap_core::error::AppError;
use incimap_core::traits::{Clock, SubjectDirectory, SystemClock};

#[tokio::main]
async fn main() {
    let env = std::env::var("INCIMAP_ENV").unwrap_or_else(|_| "development".to_string());

    let config = match AppConfig::load(&env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    init_logging(&config);
    tracing::info!("Loaded configuration (env: {})", env);

    if let Err(e) = run(config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

/// Main server run function
async fn run(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting Incimap v{}", env!("CARGO_PKG_VERSION"));

    if config.auth.uses_default_secret() {
        tracing::warn!("JWT secret is the built-in default; set INCIMAP__AUTH__JWT_SECRET");
    }

    // ── Step 1: Session and admission control ────────────────────
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let issuer = Arc::new(CredentialIssuer::new(&config.auth, Arc::clone(&clock)));
    let admission = Arc::new(AdmissionLimiter::new(&config.admission, clock));
    let directory: Arc<dyn SubjectDirectory> =
        Arc::new(InMemorySubjectDirectory::new(&config.auth.users));

    if config.auth.users.is_empty() {
        tracing::warn!("No users configured; every login will be rejected");
    }

    issuer.start_sweeper();
    admission.start_cleanup();

    // ── Step 2: Build and start HTTP server ──────────────────────
    let state = AppState::new(
        Arc::new(config.clone()),
        Arc::clone(&issuer),
        Arc::clone(&admission),
        directory,
    );

    // Write endpoints are mounted by the host application; the bare server
    // exposes only the session routes.
    let app = build_router(state, Router::new());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("Incimap server listening on {}", addr);

    // ── Step 3: Graceful shutdown ────────────────────────────────
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        shutdown_signal().await;
        tracing::info!("Shutdown signal received, starting graceful shutdown...");
        let _ = shutdown_tx.send(true);
    });

    let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
    let drain_deadline = async move {
        let _ = shutdown_rx.wait_for(|stopped| *stopped).await;
        tokio::time::sleep(grace).await;
    };

    tokio::select! {
        result = server => {
            result.map_err(|e| AppError::internal(format!("Server error: {}", e)))?;
        }
        _ = drain_deadline => {
            tracing::warn!(grace_seconds = grace.as_secs(), "Connections still open after grace period");
        }
    }

    // ── Step 4: Stop background sweeps ───────────────────────────
    issuer.shutdown();
    admission.shutdown();

    tracing::info!("Incimap server shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
