//! Access log for the HTTP API.

use std::time::Instant;

use axum::extract::Request;
use axum::http::header::RETRY_AFTER;
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

/// Logs one line per request.
///
/// Server errors log at `warn`. Throttled requests carry their `Retry-After`
/// value so admission pressure shows up in the log.
pub async fn request_logging(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = start.elapsed().as_millis() as u64;
    let retry_after = response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    if status.is_server_error() {
        warn!(%method, %path, status = status.as_u16(), duration_ms, "HTTP request failed");
    } else {
        info!(
            %method,
            %path,
            status = status.as_u16(),
            duration_ms,
            retry_after,
            "HTTP request"
        );
    }

    response
}
