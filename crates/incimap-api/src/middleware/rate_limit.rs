//! Admission middleware for public write endpoints.

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use crate::error::ApiError;
use crate::extractors::ClientKey;
use crate::state::AppState;

/// Refuses a request with 429 while the client's admission window is open.
///
/// Every admitted request stamps the client before the wrapped handler
/// runs, whatever the handler answers. The check and the stamp are two
/// calls and are not atomic; see `AdmissionLimiter`.
pub async fn admission_guard(
    State(state): State<AppState>,
    client: ClientKey,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    state.admission.check(client.as_str())?;
    state.admission.record_request(client.as_str());
    debug!(client = client.as_str(), "Admission window opened");

    Ok(next.run(request).await)
}
