//! `AuthUser` extractor: pulls the access token from the Authorization
//! header and verifies it.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use incimap_auth::TokenType;
use incimap_auth::session::UNAUTHORIZED;
use incimap_core::error::AppError;
use incimap_core::types::Subject;

use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated subject available in handlers of protected routes.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Subject);

impl AuthUser {
    /// Returns the inner subject.
    pub fn subject(&self) -> &Subject {
        &self.0
    }
}

impl std::ops::Deref for AuthUser {
    type Target = Subject;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Returns the token from an `Authorization: Bearer <token>` header, if any.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let subject = bearer_token(parts)
            .and_then(|token| state.issuer.verify(token, TokenType::Access))
            .ok_or_else(|| AppError::authentication(UNAUTHORIZED))?;

        Ok(AuthUser(subject))
    }
}
