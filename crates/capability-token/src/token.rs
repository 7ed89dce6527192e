//! The abstraction shared by every token kind.
//!
//! A capability token is some canonical byte string plus an expiry. Kinds
//! differ only in how they canonicalize; sealing, seal verification and the
//! freshness check are common.

use std::fmt;

use crate::error::TokenError;
use crate::primitives::{constant_time_eq, sign_base64url, Secret};

/// Which canonicalization a token uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Query-string canonicalization, carried in `sig`/`exp` URL parameters.
    SignedUrl,
    /// `payload.signature` bearer token carried in a header or cookie.
    Edge,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::SignedUrl => "signed-url",
            TokenKind::Edge => "edge",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub trait CapabilityToken {
    const KIND: TokenKind;

    /// The exact string the HMAC is computed over.
    fn signing_input(&self) -> Result<String, TokenError>;

    /// Unix seconds after which the token is rejected.
    fn expires_at(&self) -> i64;

    /// Compute the base64url signature for this token.
    fn seal(&self, secret: &Secret) -> Result<String, TokenError> {
        Ok(sign_base64url(secret, &self.signing_input()?))
    }

    /// Check a presented signature against the one this token should carry.
    fn verify_seal(&self, secret: &Secret, presented: &str) -> Result<(), TokenError> {
        let expected = self.seal(secret)?;
        if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
            Ok(())
        } else {
            Err(TokenError::BadSignature)
        }
    }

    /// Hard cutoff: valid through `expires_at` inclusive, rejected one second
    /// later.
    fn check_fresh(&self, now: i64) -> Result<(), TokenError> {
        let expires_at = self.expires_at();
        if now > expires_at {
            Err(TokenError::Expired { expires_at, now })
        } else {
            Ok(())
        }
    }
}
