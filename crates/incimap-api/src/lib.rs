//! # incimap-api
//!
//! HTTP boundary for Incimap session and admission control, built on Axum.
//!
//! Provides the auth endpoints (login, refresh, logout, me), the `AuthUser`
//! bearer extractor for protected routes, the admission middleware for
//! public write endpoints, and the mapping from `AppError` to responses.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
