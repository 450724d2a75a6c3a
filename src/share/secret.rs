//! In-memory secret holding with secure memory handling.
//!
//! The secret lives only in RAM for the lifetime of one run and is zeroized
//! on drop. It is never persisted to disk and never logged.

use std::sync::Arc;
use zeroize::Zeroize;

/// Characters stripped from the end of an entered secret.
const TRAILING: &[char] = &['\n', '\r', ' '];

/// The value being shared.
pub struct Secret {
    value: String,
}

impl Secret {
    /// Create a secret, trimming the trailing line ending and spaces.
    pub fn new(mut value: String) -> Self {
        let kept = value.trim_end_matches(TRAILING).len();
        value.truncate(kept);
        Self { value }
    }

    pub fn expose(&self) -> &str {
        &self.value
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Hand ownership to the serving phase, where it is read-only.
    pub fn into_shared(self) -> SharedSecret {
        Arc::new(self)
    }
}

impl Drop for Secret {
    fn drop(&mut self) {
        self.value.zeroize();
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secret")
            .field("len", &self.value.len())
            .finish_non_exhaustive()
    }
}

/// Read-only secret handle shared with the delivery handler.
pub type SharedSecret = Arc<Secret>;
