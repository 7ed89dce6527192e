//! Origin-allowlist CORS middleware.
//!
//! Every `OPTIONS` request is answered here with `204 No Content` and never
//! reaches a handler. Other responses get CORS headers added on the way out,
//! but only when the request's `Origin` is on the allowlist.

use axum::{
    body::Body,
    http::{
        header::{
            ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
            ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE,
            ORIGIN, VARY,
        },
        HeaderMap, HeaderValue, Method, Request, StatusCode,
    },
    response::{IntoResponse, Response},
};
use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

use crate::models::CorsConfig;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    allowed_origins: HashSet<String>,
    max_age: u64,
}

impl CorsPolicy {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            allowed_origins: config.allowed_origins.iter().cloned().collect(),
            max_age: config.max_age,
        }
    }

    pub fn is_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.contains(origin)
    }

    /// Add CORS headers for `origin` to a response, if it is allowed.
    pub fn apply(&self, origin: Option<&HeaderValue>, headers: &mut HeaderMap) {
        headers.append(VARY, HeaderValue::from_static("Origin"));

        let Some(origin) = origin else {
            return;
        };
        if !origin.to_str().is_ok_and(|o| self.is_allowed(o)) {
            return;
        }

        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET, OPTIONS"),
        );
        headers.insert(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static("Authorization, Content-Type"),
        );
        headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(self.max_age));
    }
}

#[derive(Clone)]
pub struct CorsLayer {
    policy: Arc<CorsPolicy>,
}

impl CorsLayer {
    pub fn new(policy: CorsPolicy) -> Self {
        Self {
            policy: Arc::new(policy),
        }
    }
}

impl<S> Layer<S> for CorsLayer {
    type Service = CorsService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorsService {
            inner,
            policy: Arc::clone(&self.policy),
        }
    }
}

#[derive(Clone)]
pub struct CorsService<S> {
    inner: S,
    policy: Arc<CorsPolicy>,
}

impl<S> Service<Request<Body>> for CorsService<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let policy = Arc::clone(&self.policy);
        let origin = req.headers().get(ORIGIN).cloned();

        if req.method() == Method::OPTIONS {
            let mut response = StatusCode::NO_CONTENT.into_response();
            policy.apply(origin.as_ref(), response.headers_mut());
            return Box::pin(async move { Ok(response) });
        }

        // Use the instance that was polled ready, leave a fresh clone behind
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            let mut response = inner.call(req).await?;
            policy.apply(origin.as_ref(), response.headers_mut());
            Ok(response)
        })
    }
}
