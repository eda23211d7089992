//! Shared test helpers for HTTP integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::ConnectInfo;
use axum::routing::post;
use http::{Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use incimap_api::{AppState, build_router};
use incimap_auth::{AdmissionLimiter, CredentialIssuer, InMemorySubjectDirectory, PasswordHasher};
use incimap_core::config::{AppConfig, SeededUser};
use incimap_core::traits::{Clock, ManualClock};

pub const EMAIL: &str = "dispatcher@example.com";
pub const PASSWORD: &str = "map-it-out";

/// Parsed response.
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: http::HeaderMap,
    pub body: Value,
}

/// Test application context
pub struct TestApp {
    /// The Axum router for making test requests
    pub router: Router,
    /// Controlled clock shared by the issuer and limiter
    pub clock: ManualClock,
    /// State handle for direct inspection
    pub state: AppState,
}

impl TestApp {
    /// Create a new test application with a one-second admission window.
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.auth.jwt_secret = "integration-secret".to_string();
        config.auth.users = vec![SeededUser {
            id: "user-1".to_string(),
            email: EMAIL.to_string(),
            password_hash: PasswordHasher::new()
                .hash_password(PASSWORD)
                .expect("hash password"),
        }];
        config.admission.window_seconds = 1;

        let clock = ManualClock::starting_now();
        let shared: Arc<dyn Clock> = Arc::new(clock.clone());

        let state = AppState::new(
            Arc::new(config.clone()),
            Arc::new(CredentialIssuer::new(&config.auth, Arc::clone(&shared))),
            Arc::new(AdmissionLimiter::with_window(
                Duration::from_secs(config.admission.window_seconds),
                Duration::from_secs(config.admission.cleanup_interval_seconds),
                shared,
            )),
            Arc::new(InMemorySubjectDirectory::new(&config.auth.users)),
        );

        let public_writes = Router::new().route("/points", post(create_point));
        let router = build_router(state.clone(), public_writes);

        Self {
            router,
            clock,
            state,
        }
    }

    /// Send a request as if it came from `peer`.
    pub async fn request_from(
        &self,
        peer: &str,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let mut request = builder.body(body).expect("build request");
        let addr: SocketAddr = format!("{peer}:40000").parse().expect("peer addr");
        request.extensions_mut().insert(ConnectInfo(addr));

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("read body")
            .to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Send a request from a fixed default peer.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> TestResponse {
        self.request_from("192.0.2.10", method, uri, body, token)
            .await
    }

    /// Log in and return `(access_token, refresh_token)`.
    pub async fn login(&self) -> (String, String) {
        let response = self
            .request(
                "POST",
                "/api/auth/login",
                Some(serde_json::json!({ "email": EMAIL, "password": PASSWORD })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK);
        let data = &response.body["data"];
        (
            data["access_token"].as_str().expect("access").to_string(),
            data["refresh_token"].as_str().expect("refresh").to_string(),
        )
    }
}

/// Stand-in public write endpoint: accepts bodies with a `lat` field.
async fn create_point(axum::Json(body): axum::Json<Value>) -> StatusCode {
    if body.get("lat").is_some() {
        StatusCode::CREATED
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}
