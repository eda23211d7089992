//! Custom Axum extractors.

pub mod auth;
pub mod client;

pub use auth::{AuthUser, bearer_token};
pub use client::ClientKey;
