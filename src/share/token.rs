//! Capability token generation.
//!
//! The token is the entire access-control mechanism of the service: 16 bytes
//! from the OS random source, encoded as unpadded URL-safe base64. There is
//! no fallback to a weaker generator.

use crate::error::AppResult;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use rand::rngs::OsRng;
use rand::RngCore;

/// Number of random bytes behind each token.
pub const TOKEN_BYTES: usize = 16;

/// Encoded length of a token (16 bytes, no padding).
pub const TOKEN_LEN: usize = 22;

/// Unguessable URL path segment granting access to the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct CapabilityToken(String);

impl CapabilityToken {
    /// Draw a fresh token from the OS random source.
    pub fn generate() -> AppResult<Self> {
        Self::generate_from(&mut OsRng)
    }

    /// Draw a token from the given generator, failing if it cannot deliver.
    pub fn generate_from<R: RngCore + ?Sized>(rng: &mut R) -> AppResult<Self> {
        let mut bytes = [0u8; TOKEN_BYTES];
        rng.try_fill_bytes(&mut bytes)?;
        Ok(Self(BASE64_URL.encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Route path the delivery handler is registered on.
    pub fn route_path(&self) -> String {
        format!("/{}", self.0)
    }
}

// Tokens only show up in full inside the sharing URL.
impl std::fmt::Debug for CapabilityToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CapabilityToken({}…)", &self.0[..4])
    }
}
