//! CORS layer for browser clients of the map.

use std::str::FromStr;
use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};
use tracing::warn;

use incimap_core::config::CorsConfig;

/// Builds the CORS layer from configuration.
///
/// `"*"` in any list means "any". Entries that do not parse are skipped with
/// a warning. `Retry-After` is always exposed so browser clients can read
/// the wait on a 429.
pub fn build_cors_layer(config: &CorsConfig) -> CorsLayer {
    let origins = if is_wildcard(&config.allowed_origins) {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(parse_entries::<HeaderValue>(&config.allowed_origins, "origin"))
    };

    let methods = if is_wildcard(&config.allowed_methods) {
        AllowMethods::from(Any)
    } else {
        AllowMethods::list(parse_entries::<Method>(&config.allowed_methods, "method"))
    };

    let headers = if is_wildcard(&config.allowed_headers) {
        AllowHeaders::from(Any)
    } else {
        AllowHeaders::list(parse_entries::<HeaderName>(&config.allowed_headers, "header"))
    };

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers([header::RETRY_AFTER])
        .max_age(Duration::from_secs(config.max_age_seconds))
}

fn is_wildcard(entries: &[String]) -> bool {
    entries.iter().any(|e| e == "*")
}

fn parse_entries<T: FromStr>(entries: &[String], kind: &'static str) -> Vec<T> {
    entries
        .iter()
        .filter_map(|entry| match entry.trim().parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(kind, entry = %entry, "Ignoring unparseable CORS entry");
                None
            }
        })
        .collect()
}
