use capability_token::{Secret, DEFAULT_TTL_SECS};
use reqwest::Url;
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use thiserror::Error;

pub const TUNNEL_SECRET_VAR: &str = "TUNNEL_SECRET";
pub const SESSION_SECRET_VAR: &str = "SESSION_SECRET";
pub const EDGE_TOKEN_SECRET_VAR: &str = "EDGE_TOKEN_SECRET";

/// Errors that stop the gateway from starting.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required secret: {0}")]
    MissingSecret(&'static str),

    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid target '{name}': {reason}")]
    InvalidTarget { name: String, reason: String },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

/// Gateway configuration loaded from config.yaml plus environment overrides.
///
/// Secrets are read from the environment into [`Secrets`], never from the file.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Origin prepended to signed paths
    #[serde(default = "default_public_origin")]
    pub public_origin: String,

    /// Lifetime of signed URLs and edge tokens, in seconds
    #[serde(default = "default_ttl")]
    pub default_ttl: u64,

    /// Internal services reachable through the gateway
    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,

    #[serde(default)]
    pub cors: CorsConfig,

    #[serde(default = "default_upstream_timeout")]
    pub upstream_timeout_secs: u64,

    /// Largest request body forwarded upstream
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,

    /// Cookie holding the session token minted by the login service
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
}

/// One internal service and the path prefix it is mounted under.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct TargetConfig {
    pub name: String,

    /// Path prefix, e.g. "/photon". Stripped before forwarding.
    pub prefix: String,

    /// Internal base URL, e.g. "http://localhost:5000"
    pub base_url: String,

    /// Extra headers sent on every upstream request (access tokens etc.)
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,

    /// Preflight cache lifetime in seconds
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: default_allowed_origins(),
            max_age: default_cors_max_age(),
        }
    }
}

fn default_public_origin() -> String {
    "http://localhost:4000".to_string()
}

fn default_ttl() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_targets() -> Vec<TargetConfig> {
    vec![
        TargetConfig {
            name: "photon".to_string(),
            prefix: "/photon".to_string(),
            base_url: "http://localhost:5000".to_string(),
            headers: BTreeMap::new(),
        },
        TargetConfig {
            name: "otp".to_string(),
            prefix: "/otp".to_string(),
            base_url: "http://127.0.0.1:8080".to_string(),
            headers: BTreeMap::new(),
        },
    ]
}

fn default_allowed_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string()]
}

fn default_cors_max_age() -> u64 {
    86400
}

fn default_upstream_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_session_cookie() -> String {
    "session".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            public_origin: default_public_origin(),
            default_ttl: default_ttl(),
            targets: default_targets(),
            cors: CorsConfig::default(),
            upstream_timeout_secs: default_upstream_timeout(),
            max_body_bytes: default_max_body_bytes(),
            session_cookie: default_session_cookie(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file, or the built-in defaults when no
    /// file is configured.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            tracing::info!("No config file configured, using defaults");
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config = Self::from_yaml(&content)?;

        tracing::info!(
            path = %path.display(),
            targets = config.targets.len(),
            origins = config.cors.allowed_origins.len(),
            "Loaded configuration"
        );
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Apply `PUBLIC_ORIGIN`, `DEFAULT_TTL` and `ALLOWED_ORIGINS` overrides.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup("PUBLIC_ORIGIN") {
            self.public_origin = origin;
        }
        if let Some(ttl) = lookup("DEFAULT_TTL") {
            self.default_ttl = ttl.trim().parse().map_err(|_| ConfigError::InvalidValue {
                field: "DEFAULT_TTL",
                reason: format!("'{ttl}' is not a number of seconds"),
            })?;
        }
        if let Some(origins) = lookup("ALLOWED_ORIGINS") {
            self.cors.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(String::from)
                .collect();
        }
        Ok(())
    }

    /// Reject configurations the gateway cannot serve correctly.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_ttl == 0 {
            return Err(ConfigError::InvalidValue {
                field: "default_ttl",
                reason: "must be positive".to_string(),
            });
        }
        if self.upstream_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "upstream_timeout_secs",
                reason: "must be positive".to_string(),
            });
        }
        parse_http_url(&self.public_origin).map_err(|reason| ConfigError::InvalidValue {
            field: "public_origin",
            reason,
        })?;
        if self.session_cookie.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "session_cookie",
                reason: "must not be empty".to_string(),
            });
        }

        let mut prefixes = HashSet::new();
        for target in &self.targets {
            let invalid = |reason: &str| ConfigError::InvalidTarget {
                name: target.name.clone(),
                reason: reason.to_string(),
            };
            if target.name.is_empty() {
                return Err(invalid("name must not be empty"));
            }
            if !target.prefix.starts_with('/') || target.prefix.len() < 2 {
                return Err(invalid("prefix must start with '/' and name a path segment"));
            }
            if target.prefix.ends_with('/') {
                return Err(invalid("prefix must not end with '/'"));
            }
            if !prefixes.insert(target.prefix.as_str()) {
                return Err(invalid("prefix is used by another target"));
            }
            parse_http_url(&target.base_url).map_err(|reason| invalid(&reason))?;
        }

        Ok(())
    }
}

fn parse_http_url(value: &str) -> Result<Url, String> {
    let url = Url::parse(value).map_err(|e| format!("'{value}' is not a URL: {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(format!("unsupported scheme '{other}'")),
    }
}

/// Signing secrets, read from the environment once at startup.
#[derive(Debug, Clone)]
pub struct Secrets {
    /// Signs tunnel URLs
    pub tunnel: Secret,
    /// Verifies the session cookie minted by the login service
    pub session: Secret,
    /// Signs edge bearer tokens; edge routes are disabled without it
    pub edge: Option<Secret>,
}

impl Secrets {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &'static str| lookup(name).filter(|v| !v.is_empty()).map(Secret::from);

        Ok(Self {
            tunnel: read(TUNNEL_SECRET_VAR).ok_or(ConfigError::MissingSecret(TUNNEL_SECRET_VAR))?,
            session: read(SESSION_SECRET_VAR)
                .ok_or(ConfigError::MissingSecret(SESSION_SECRET_VAR))?,
            edge: read(EDGE_TOKEN_SECRET_VAR),
        })
    }
}
