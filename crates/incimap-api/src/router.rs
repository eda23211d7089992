//! Route definitions for the Incimap HTTP API.
//!
//! All routes are mounted under `/api`. Public write endpoints supplied by
//! the host application are wrapped with the admission middleware.

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// `public_writes` holds the unauthenticated write endpoints to throttle
/// per client address; pass `Router::new()` when there are none. Their paths
/// are relative to `/api`.
pub fn build_router(state: AppState, public_writes: Router<AppState>) -> Router {
    let guarded = public_writes.layer(axum_middleware::from_fn_with_state(
        state.clone(),
        middleware::rate_limit::admission_guard,
    ));

    let api_routes = Router::new()
        .merge(auth_routes())
        .merge(health_routes())
        .merge(guarded);

    let cors = middleware::cors::build_cors_layer(&state.config.server.cors);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(axum_middleware::from_fn(middleware::logging::request_logging))
        .with_state(state)
}

/// Auth endpoints: login, refresh, logout, me
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(handlers::auth::login))
        .route("/auth/refresh", post(handlers::auth::refresh))
        .route("/auth/logout", post(handlers::auth::logout))
        .route("/auth/me", get(handlers::auth::me))
}

/// Health endpoint
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
