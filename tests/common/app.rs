//! Test application factory for integration tests.

use axum::{
    body::Body,
    http::{Method, Request, StatusCode},
};
use capability_token::{EdgeTokenCodec, Secret, SignedUrl, UrlSigner};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use maptunnel::models::{AppConfig, Secrets};
use maptunnel::server::{build_router, create_app_state};
use maptunnel::services::FixedClock;

use super::fixtures::{self, NOW, ORIGIN, SESSION_SECRET, EDGE_SECRET, TUNNEL_SECRET};
use super::mock_server::MockHttpServer;

/// Test application with router and a controllable clock
pub struct TestApp {
    router: axum::Router,
    pub clock: Arc<FixedClock>,
}

impl TestApp {
    /// App whose targets both point at an address that refuses connections
    pub fn new() -> Self {
        Self::with_config(
            fixtures::test_config(fixtures::DEAD_URL, fixtures::DEAD_URL),
            fixtures::test_secrets(),
        )
    }

    /// App whose "photon" target is `upstream`; "otp" is unreachable
    pub fn with_upstream(upstream: &MockHttpServer) -> Self {
        Self::with_config(
            fixtures::test_config(&upstream.url(), fixtures::DEAD_URL),
            fixtures::test_secrets(),
        )
    }

    pub fn with_config(config: AppConfig, secrets: Secrets) -> Self {
        let clock = Arc::new(FixedClock::new(NOW));
        let state =
            create_app_state(config, secrets, clock.clone()).expect("Failed to create app state");

        // Build router using shared server module (same as production)
        let router = build_router(state);

        Self { router, clock }
    }

    /// Signer sharing the app's secret and origin
    pub fn signer() -> UrlSigner {
        UrlSigner::new(Secret::from(TUNNEL_SECRET), ORIGIN)
    }

    /// Sign `path` at the current test time with the default TTL
    pub fn sign(&self, path: &str, params: Vec<(String, String)>) -> SignedUrl {
        Self::signer()
            .sign(path, params, 120, self.now())
            .expect("Failed to sign")
    }

    pub fn now(&self) -> i64 {
        use maptunnel::services::Clock;
        self.clock.now()
    }

    /// `Cookie` header value carrying a fresh session for `sub`
    pub fn session_cookie(&self, sub: &str) -> String {
        let codec = EdgeTokenCodec::new(Secret::from(SESSION_SECRET));
        let issued = codec
            .issue(sub, 3600, self.now())
            .expect("Failed to issue session");
        format!("session={}", issued.token)
    }

    /// `Authorization` header value carrying an edge token for `sub`
    pub fn edge_bearer(&self, sub: &str) -> String {
        let codec = EdgeTokenCodec::new(Secret::from(EDGE_SECRET));
        let issued = codec
            .issue(sub, 120, self.now())
            .expect("Failed to issue edge token");
        format!("Bearer {}", issued.token)
    }

    /// Make a GET request to the given path
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request(Request::get(path).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request with custom headers
    pub async fn get_with_headers(&self, path: &str, headers: &[(&str, &str)]) -> TestResponse {
        self.send(Method::GET, path, headers, Body::empty()).await
    }

    /// Make a request with any method, headers and body
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        headers: &[(&str, &str)],
        body: impl Into<Body>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        self.request(builder.body(body.into()).unwrap()).await
    }

    /// Send a request to the router
    pub async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Request failed");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes()
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// Test response with convenience methods
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    /// Parse body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> T {
        serde_json::from_slice(&self.body).expect("Failed to parse JSON response")
    }

    /// Get body as string
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
