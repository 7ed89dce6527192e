use axum::http::{HeaderName, HeaderValue};

use super::config::{ConfigError, TargetConfig};

/// An internal service resolved from configuration.
#[derive(Debug, Clone)]
pub struct Target {
    pub name: String,
    pub prefix: String,
    /// Base URL without a trailing slash
    pub base_url: String,
    pub headers: Vec<(HeaderName, HeaderValue)>,
}

impl Target {
    /// Upstream URL for the remainder of a path (prefix already stripped)
    /// and an optional query string.
    pub fn upstream_url(&self, rest: &str, query: Option<&str>) -> String {
        match query {
            Some(q) if !q.is_empty() => format!("{}{rest}?{q}", self.base_url),
            _ => format!("{}{rest}", self.base_url),
        }
    }
}

/// Prefix-based lookup from request path to internal target.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    targets: Vec<Target>,
}

impl RouteTable {
    pub fn from_config(targets: &[TargetConfig]) -> Result<Self, ConfigError> {
        let targets = targets
            .iter()
            .map(|t| {
                let headers = t
                    .headers
                    .iter()
                    .map(|(name, value)| {
                        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
                            ConfigError::InvalidTarget {
                                name: t.name.clone(),
                                reason: format!("invalid header name '{name}'"),
                            }
                        })?;
                        let value = HeaderValue::from_str(value).map_err(|_| {
                            ConfigError::InvalidTarget {
                                name: t.name.clone(),
                                reason: format!("invalid value for header '{name}'"),
                            }
                        })?;
                        Ok((name, value))
                    })
                    .collect::<Result<Vec<_>, ConfigError>>()?;

                Ok(Target {
                    name: t.name.clone(),
                    prefix: t.prefix.clone(),
                    base_url: t.base_url.trim_end_matches('/').to_string(),
                    headers,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { targets })
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    /// Find the target mounted at the start of `path` and return it with the
    /// remainder of the path. A prefix only matches whole segments:
    /// "/photon" matches "/photon" and "/photon/api" but not "/photonx".
    pub fn resolve<'a>(&self, path: &'a str) -> Option<(&Target, &'a str)> {
        self.targets.iter().find_map(|target| {
            let rest = path.strip_prefix(target.prefix.as_str())?;
            if rest.is_empty() || rest.starts_with('/') {
                Some((target, rest))
            } else {
                None
            }
        })
    }
}
