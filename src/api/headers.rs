//! Header parsing utilities for gateway requests.

use axum::http::{header, HeaderMap};

/// Extension trait for convenient header parsing.
pub trait HeaderMapExt {
    /// Get a header value as a string, returning None if missing or not ASCII.
    fn get_str(&self, name: &str) -> Option<&str>;

    /// Token from an `Authorization: Bearer <token>` header.
    fn bearer_token(&self) -> Option<&str>;

    /// Value of the named cookie from the `Cookie` header(s).
    fn cookie(&self, name: &str) -> Option<&str>;
}

impl HeaderMapExt for HeaderMap {
    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| v.to_str().ok())
    }

    fn bearer_token(&self) -> Option<&str> {
        self.get_str(header::AUTHORIZATION.as_str())?
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }

    fn cookie(&self, name: &str) -> Option<&str> {
        self.get_all(header::COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .flat_map(|v| v.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value)
    }
}
