//! Signing secret material
//!
//! Secrets are either supplied through the environment or generated from the
//! OS random source at startup. Generated secrets are not persisted.

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::{rngs::OsRng, RngCore};

/// Number of random bytes in a generated secret
const GENERATED_SECRET_BYTES: usize = 32;

/// Where a signing secret came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretOrigin {
    /// Read from the environment
    Provided,
    /// Generated at startup; lost on restart
    Generated,
}

/// HMAC signing secret
///
/// The `Debug` output never contains the secret itself.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningSecret {
    value: String,
    origin: SecretOrigin,
}

impl SigningSecret {
    /// Wrap an externally supplied secret
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            origin: SecretOrigin::Provided,
        }
    }

    /// Generate a random URL-safe secret from the OS random source
    #[must_use]
    pub fn generate() -> Self {
        let mut bytes = [0u8; GENERATED_SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);

        Self {
            value: URL_SAFE_NO_PAD.encode(bytes),
            origin: SecretOrigin::Generated,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.value.as_bytes()
    }

    #[must_use]
    pub fn origin(&self) -> SecretOrigin {
        self.origin
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
