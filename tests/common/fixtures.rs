//! Test fixtures and constants.

use capability_token::Secret;
use std::collections::BTreeMap;

use maptunnel::models::{AppConfig, CorsConfig, Secrets, TargetConfig};

/// Time the test clock starts at (unix seconds)
pub const NOW: i64 = 1000;

/// Public origin signed URLs are issued under
pub const ORIGIN: &str = "https://tunnel.test";

/// Browser origin on the CORS allowlist
pub const FRONTEND_ORIGIN: &str = "http://localhost:3000";

pub const TUNNEL_SECRET: &str = "test-tunnel-secret";
pub const SESSION_SECRET: &str = "test-session-secret";
pub const EDGE_SECRET: &str = "test-edge-secret";

/// Address nothing listens on; connections are refused immediately
pub const DEAD_URL: &str = "http://127.0.0.1:1";

pub fn test_secrets() -> Secrets {
    Secrets {
        tunnel: Secret::from(TUNNEL_SECRET),
        session: Secret::from(SESSION_SECRET),
        edge: Some(Secret::from(EDGE_SECRET)),
    }
}

/// Targets "photon" at `/photon` and "otp" at `/otp`.
pub fn test_config(photon_url: &str, otp_url: &str) -> AppConfig {
    AppConfig {
        public_origin: ORIGIN.to_string(),
        default_ttl: 120,
        targets: vec![
            TargetConfig {
                name: "photon".to_string(),
                prefix: "/photon".to_string(),
                base_url: photon_url.to_string(),
                headers: BTreeMap::new(),
            },
            TargetConfig {
                name: "otp".to_string(),
                prefix: "/otp".to_string(),
                base_url: otp_url.to_string(),
                headers: BTreeMap::from([("x-otp-key".to_string(), "internal-key".to_string())]),
            },
        ],
        cors: CorsConfig {
            allowed_origins: vec![FRONTEND_ORIGIN.to_string()],
            max_age: 86400,
        },
        ..AppConfig::default()
    }
}

/// Strip the public origin from a signed URL, leaving path and query.
pub fn path_of(url: &str) -> &str {
    url.strip_prefix(ORIGIN)
        .unwrap_or_else(|| panic!("URL {url} is not under {ORIGIN}"))
}

/// `name=value` pairs for the park geocoding query.
pub fn park_params() -> Vec<(String, String)> {
    [("q", "park"), ("lat", "45.5"), ("lon", "-73.6")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
