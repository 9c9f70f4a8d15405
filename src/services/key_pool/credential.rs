//! Credential type
//!
//! A credential is an opaque secret (usually an API key). The engine never
//! inspects it beyond passing it to an invoker, and every display path goes
//! through masking.

use crate::utils::mask_secret;
use serde::Deserialize;
use std::fmt;

/// Default number of leading characters shown when a credential is masked
pub const DEFAULT_MASK_PREFIX: usize = 10;

/// An opaque secret used to authorize one invocation attempt
#[derive(Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    /// Get the raw secret
    ///
    /// Only invokers should call this, to put the key on the wire.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form for logs and console output
    pub fn masked(&self, prefix_chars: usize) -> String {
        mask_secret(&self.0, prefix_chars)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential")
            .field(&self.masked(DEFAULT_MASK_PREFIX))
            .finish()
    }
}

impl From<&str> for Credential {
    fn from(secret: &str) -> Self {
        Self::new(secret)
    }
}

impl From<String> for Credential {
    fn from(secret: String) -> Self {
        Self(secret)
    }
}

impl From<&String> for Credential {
    fn from(secret: &String) -> Self {
        Self(secret.clone())
    }
}
