//! Bearer edge tokens: `base64url(JSON claims) + "." + base64url(HMAC)`.
//!
//! The HMAC covers the encoded payload segment exactly as transmitted and is
//! checked before that segment is decoded, so unauthenticated input never
//! reaches the JSON parser.

use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::primitives::{
    constant_time_eq, decode_base64url, encode_base64url, sign_base64url, Secret,
};
use crate::token::{CapabilityToken, TokenKind};

/// Claims carried by an edge token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeClaims {
    /// Subject (user id) the token was issued to.
    pub sub: String,
    /// Expiry in unix seconds.
    pub exp: i64,
}

/// A token payload and its decoded claims.
#[derive(Debug, Clone)]
struct EdgeToken {
    payload: String,
    claims: EdgeClaims,
}

impl EdgeToken {
    fn encode(claims: EdgeClaims) -> Result<Self, TokenError> {
        let json = serde_json::to_vec(&claims).map_err(|e| TokenError::Encoding(e.to_string()))?;
        Ok(Self {
            payload: encode_base64url(&json),
            claims,
        })
    }

    fn decode(payload: &str) -> Result<Self, TokenError> {
        let json = decode_base64url(payload).ok_or(TokenError::Malformed("payload encoding"))?;
        let claims: EdgeClaims =
            serde_json::from_slice(&json).map_err(|_| TokenError::Malformed("payload claims"))?;
        Ok(Self {
            payload: payload.to_string(),
            claims,
        })
    }
}

impl CapabilityToken for EdgeToken {
    const KIND: TokenKind = TokenKind::Edge;

    fn signing_input(&self) -> Result<String, TokenError> {
        Ok(self.payload.clone())
    }

    fn expires_at(&self) -> i64 {
        self.claims.exp
    }
}

/// A freshly minted token and its expiry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssuedEdgeToken {
    pub token: String,
    pub exp: i64,
}

/// Issues and verifies edge-format tokens under one secret.
///
/// The same format serves the bearer tokens used on `/edge` routes and the
/// session cookie minted by the login service; each uses its own secret.
pub struct EdgeTokenCodec {
    secret: Secret,
}

impl EdgeTokenCodec {
    pub fn new(secret: Secret) -> Self {
        Self { secret }
    }

    pub fn kind(&self) -> TokenKind {
        EdgeToken::KIND
    }

    pub fn issue(&self, sub: &str, ttl_secs: u64, now: i64) -> Result<IssuedEdgeToken, TokenError> {
        if sub.is_empty() {
            return Err(TokenError::MissingField("sub"));
        }
        if ttl_secs == 0 {
            return Err(TokenError::InvalidTtl);
        }
        let exp = i64::try_from(ttl_secs)
            .ok()
            .and_then(|ttl| now.checked_add(ttl))
            .ok_or(TokenError::InvalidTtl)?;

        let token = EdgeToken::encode(EdgeClaims {
            sub: sub.to_string(),
            exp,
        })?;
        let sig = token.seal(&self.secret)?;

        Ok(IssuedEdgeToken {
            token: format!("{}.{sig}", token.payload),
            exp,
        })
    }

    pub fn verify(&self, token: &str, now: i64) -> Result<EdgeClaims, TokenError> {
        let mut segments = token.split('.');
        let (payload, sig) = match (segments.next(), segments.next(), segments.next()) {
            (Some(payload), Some(sig), None) if !payload.is_empty() && !sig.is_empty() => {
                (payload, sig)
            }
            _ => return Err(TokenError::Malformed("segments")),
        };

        let expected = sign_base64url(&self.secret, payload);
        if !constant_time_eq(sig.as_bytes(), expected.as_bytes()) {
            return Err(TokenError::BadSignature);
        }

        let token = EdgeToken::decode(payload)?;
        token.check_fresh(now)?;
        Ok(token.claims)
    }
}
