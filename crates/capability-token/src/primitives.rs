//! Shared building blocks for every token kind: the secret key, HMAC-SHA256,
//! unpadded base64url and constant-time comparison.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Length of a raw HMAC-SHA256 digest in bytes.
pub const DIGEST_LEN: usize = 32;

/// Length of a digest once base64url-encoded without padding.
pub const ENCODED_DIGEST_LEN: usize = 43;

/// Symmetric signing key.
///
/// The key bytes never appear in `Debug` output so a secret cannot leak
/// through a stray `?config` in a log line.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(Vec<u8>);

impl Secret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self(bytes.into())
    }

    /// Generate a fresh 32-byte random secret.
    pub fn generate() -> Self {
        use rand::Rng;
        let bytes: [u8; 32] = rand::thread_rng().gen();
        Self(bytes.to_vec())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Encode the key as base64url, for printing a generated secret once.
    pub fn to_base64url(&self) -> String {
        encode_base64url(&self.0)
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.as_bytes().to_vec())
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value.into_bytes())
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(<redacted>)")
    }
}

/// Raw HMAC-SHA256 of `message` under `secret`.
pub fn hmac_sha256(secret: &Secret, message: &[u8]) -> [u8; DIGEST_LEN] {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(message);
    mac.finalize().into_bytes().into()
}

/// HMAC-SHA256 of `message`, base64url-encoded without padding.
pub fn sign_base64url(secret: &Secret, message: &str) -> String {
    encode_base64url(&hmac_sha256(secret, message.as_bytes()))
}

pub fn encode_base64url(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(bytes)
}

pub fn decode_base64url(encoded: &str) -> Option<Vec<u8>> {
    URL_SAFE_NO_PAD.decode(encoded).ok()
}

/// Compare two byte strings without short-circuiting on the first mismatch.
///
/// Lengths are compared first; a length mismatch is not secret since every
/// valid signature has the same encoded length.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
