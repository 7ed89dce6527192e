//! Time-limited signed URLs.
//!
//! A signed URL is `origin + path + "?" + query + "&sig=" + signature` where
//! `query` is the form-urlencoded parameters in insertion order followed by
//! `exp`. The signature covers `path + "?" + query`, so the expiry is signed
//! together with every parameter.

use serde::Serialize;

use crate::error::TokenError;
use crate::primitives::{sign_base64url, Secret};
use crate::token::{CapabilityToken, TokenKind};

pub const SIG_PARAM: &str = "sig";
pub const EXP_PARAM: &str = "exp";

/// Lifetime of a signed URL when the caller does not pick one.
pub const DEFAULT_TTL_SECS: u64 = 120;

/// A path, its parameters and an expiry: everything a signature covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    path: String,
    params: Vec<(String, String)>,
    expires_at: i64,
}

impl SignedRequest {
    pub fn new(
        path: impl Into<String>,
        params: Vec<(String, String)>,
        expires_at: i64,
    ) -> Result<Self, TokenError> {
        let path = path.into();
        if !is_valid_path(&path) {
            return Err(TokenError::InvalidPath);
        }
        if let Some((name, _)) = params
            .iter()
            .find(|(name, _)| name == SIG_PARAM || name == EXP_PARAM)
        {
            return Err(TokenError::ReservedParam(name.clone()));
        }
        Ok(Self {
            path,
            params,
            expires_at,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn params(&self) -> &[(String, String)] {
        &self.params
    }

    /// Parameters followed by `exp`, form-urlencoded.
    pub fn canonical_query(&self) -> Result<String, TokenError> {
        let exp = self.expires_at.to_string();
        let pairs: Vec<(&str, &str)> = self
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(std::iter::once((EXP_PARAM, exp.as_str())))
            .collect();
        encode_pairs(&pairs)
    }

    /// The path and parameters with `sig` and `exp` stripped.
    pub fn forward_path(&self) -> Result<String, TokenError> {
        if self.params.is_empty() {
            return Ok(self.path.clone());
        }
        Ok(format!("{}?{}", self.path, encode_pairs(&self.params)?))
    }
}

impl CapabilityToken for SignedRequest {
    const KIND: TokenKind = TokenKind::SignedUrl;

    fn signing_input(&self) -> Result<String, TokenError> {
        Ok(format!("{}?{}", self.path, self.canonical_query()?))
    }

    fn expires_at(&self) -> i64 {
        self.expires_at
    }
}

/// Result of signing: the absolute URL and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignedUrl {
    pub url: String,
    pub exp: i64,
}

/// A request that passed verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedRequest(SignedRequest);

impl VerifiedRequest {
    pub fn path(&self) -> &str {
        self.0.path()
    }

    pub fn params(&self) -> &[(String, String)] {
        self.0.params()
    }

    pub fn expires_at(&self) -> i64 {
        self.0.expires_at
    }

    /// Cleaned path+query to hand to the forwarder.
    pub fn forward_path(&self) -> Result<String, TokenError> {
        self.0.forward_path()
    }
}

/// Signs and verifies URLs with one secret.
pub struct UrlSigner {
    secret: Secret,
    origin: String,
}

impl UrlSigner {
    /// `origin` is prepended to signed paths, e.g. `https://tunnel.example.org`.
    pub fn new(secret: Secret, origin: impl Into<String>) -> Self {
        let origin = origin.into().trim_end_matches('/').to_string();
        Self { secret, origin }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn kind(&self) -> TokenKind {
        SignedRequest::KIND
    }

    pub fn sign(
        &self,
        path: &str,
        params: Vec<(String, String)>,
        ttl_secs: u64,
        now: i64,
    ) -> Result<SignedUrl, TokenError> {
        if ttl_secs == 0 {
            return Err(TokenError::InvalidTtl);
        }
        let exp = i64::try_from(ttl_secs)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::InvalidTtl)?;

        let request = SignedRequest::new(path, params, exp)?;
        let base = request.signing_input()?;
        let sig = sign_base64url(&self.secret, &base);

        Ok(SignedUrl {
            url: format!("{}{base}&{SIG_PARAM}={sig}", self.origin),
            exp,
        })
    }

    /// Verify a path+query as received by the gateway.
    ///
    /// Expiry is checked before the signature. Every failure is a
    /// [`TokenError`] describing the reason; callers must not echo it.
    pub fn verify(&self, path_and_query: &str, now: i64) -> Result<VerifiedRequest, TokenError> {
        let (request, sig) = parse_signed(path_and_query)?;
        request.check_fresh(now)?;
        request.verify_seal(&self.secret, &sig)?;
        Ok(VerifiedRequest(request))
    }
}

/// Split a received path+query into the signed request and the presented
/// signature. Parameter order is preserved.
fn parse_signed(path_and_query: &str) -> Result<(SignedRequest, String), TokenError> {
    let (path, query) = path_and_query
        .split_once('?')
        .ok_or(TokenError::MissingField(SIG_PARAM))?;
    if !path.starts_with('/') {
        return Err(TokenError::Malformed("path"));
    }

    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query).map_err(|_| TokenError::Malformed("query"))?;

    let mut sig = None;
    let mut exp = None;
    let mut params = Vec::with_capacity(pairs.len());
    for (name, value) in pairs {
        match name.as_str() {
            SIG_PARAM if sig.is_some() => return Err(TokenError::DuplicateField(SIG_PARAM)),
            SIG_PARAM => sig = Some(value),
            EXP_PARAM if exp.is_some() => return Err(TokenError::DuplicateField(EXP_PARAM)),
            EXP_PARAM => exp = Some(value),
            _ => params.push((name, value)),
        }
    }

    let sig = sig.ok_or(TokenError::MissingField(SIG_PARAM))?;
    let expires_at = exp
        .ok_or(TokenError::MissingField(EXP_PARAM))?
        .parse::<i64>()
        .map_err(|_| TokenError::InvalidExpiry)?;

    Ok((
        SignedRequest {
            path: path.to_string(),
            params,
            expires_at,
        },
        sig,
    ))
}

/// Paths are sent verbatim, so they must already be valid in a URL: visible
/// ASCII, rooted, no query or fragment.
fn is_valid_path(path: &str) -> bool {
    path.starts_with('/')
        && path
            .bytes()
            .all(|b| b.is_ascii_graphic() && b != b'?' && b != b'#')
}

fn encode_pairs<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> Result<String, TokenError> {
    let pairs: Vec<(&str, &str)> = pairs.iter().map(|(k, v)| (k.as_ref(), v.as_ref())).collect();
    serde_urlencoded::to_string(pairs).map_err(|e| TokenError::Encoding(e.to_string()))
}
