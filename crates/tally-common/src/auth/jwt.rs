//! JWT utilities for authentication
//!
//! Access and refresh tokens are signed with two independent HMAC secrets.
//! Verification needs the caller to say which kind it expects; a token of the
//! other kind is rejected even when its signature and expiry are fine.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::{Duration, TimeDelta};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::clock::{Clock, SystemClock};
use crate::config::{JwtConfig, SigningSecret};
use crate::error::{AppError, AppResult};

/// The only algorithm tokens are signed with or accepted under
pub const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claim names always set by the service, never by the caller
const RESERVED_CLAIMS: [&str; 4] = ["sub", "exp", "type", "iat"];

/// Token type enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user identity, e.g. email)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token kind, serialized as `type`
    #[serde(rename = "type")]
    pub kind: TokenKind,
    /// Issued at (Unix timestamp)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
    /// Caller-supplied claims
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// Look up a caller-supplied claim
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.extra.get(name)
    }
}

/// Token pair containing access and refresh tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Why a token was turned away. Logged, never returned.
#[derive(Debug, thiserror::Error)]
enum RejectReason {
    #[error("malformed token: {0}")]
    Malformed(String),

    #[error("signature does not verify")]
    BadSignature,

    #[error("token expired at {exp}, now {now}")]
    Expired { exp: i64, now: i64 },

    #[error("expected {expected} token, got {found}")]
    KindMismatch { expected: TokenKind, found: TokenKind },
}

#[derive(Clone)]
struct SigningKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SigningKeys {
    fn from_secret(secret: &SigningSecret) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

/// JWT service for issuing and verifying tokens
#[derive(Clone)]
pub struct JwtService {
    access_keys: SigningKeys,
    refresh_keys: SigningKeys,
    access_token_expiry: i64,
    refresh_token_expiry: i64,
    leeway: i64,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtService {
    /// Create a JWT service reading the wall clock
    #[must_use]
    pub fn new(config: &JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a JWT service with a custom time source
    #[must_use]
    pub fn with_clock(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(SIGNING_ALGORITHM);
        // Expiry is checked against `clock` in `check`
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.required_spec_claims =
            HashSet::from(["exp".to_string(), "sub".to_string()]);

        Self {
            access_keys: SigningKeys::from_secret(&config.access_secret),
            refresh_keys: SigningKeys::from_secret(&config.refresh_secret),
            access_token_expiry: config.access_token_expiry,
            refresh_token_expiry: config.refresh_token_expiry,
            leeway: config.leeway,
            validation,
            clock,
        }
    }

    fn keys(&self, kind: TokenKind) -> &SigningKeys {
        match kind {
            TokenKind::Access => &self.access_keys,
            TokenKind::Refresh => &self.refresh_keys,
        }
    }

    /// Default lifetime for tokens of the given kind
    ///
    /// # Errors
    /// Returns an error if the configured lifetime is out of range
    pub fn lifetime(&self, kind: TokenKind) -> AppResult<Duration> {
        let seconds = match kind {
            TokenKind::Access => self.access_token_expiry,
            TokenKind::Refresh => self.refresh_token_expiry,
        };

        TimeDelta::try_seconds(seconds).ok_or_else(|| {
            AppError::internal(anyhow::anyhow!(
                "Configured {kind} token lifetime out of range: {seconds}s"
            ))
        })
    }

    /// Issue a signed token
    ///
    /// `extra_claims` are merged in first; `sub`, `type`, `iat` and `exp` are
    /// then set by the service, so callers can neither forge a lifetime nor
    /// switch the kind. `lifetime` overrides the per-kind default and may be
    /// negative.
    ///
    /// # Errors
    /// Returns an error if the expiry is not representable or token encoding
    /// fails
    pub fn issue(
        &self,
        subject: &str,
        kind: TokenKind,
        extra_claims: Map<String, Value>,
        lifetime: Option<Duration>,
    ) -> AppResult<String> {
        let mut extra = extra_claims;
        for name in RESERVED_CLAIMS {
            if extra.remove(name).is_some() {
                debug!(claim = name, "Ignoring caller-supplied reserved claim");
            }
        }

        let now = self.clock.now();
        let lifetime = match lifetime {
            Some(lifetime) => lifetime,
            None => self.lifetime(kind)?,
        };
        let exp = now.checked_add_signed(lifetime).ok_or_else(|| {
            AppError::internal(anyhow::anyhow!(
                "Token expiry out of range: {now} + {lifetime}"
            ))
        })?;

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.timestamp(),
            kind,
            iat: Some(now.timestamp()),
            extra,
        };

        encode(
            &Header::new(SIGNING_ALGORITHM),
            &claims,
            &self.keys(kind).encoding,
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to encode JWT: {e}")))
    }

    /// Issue an access token and a refresh token for the same subject
    ///
    /// # Errors
    /// Returns an error if token encoding fails
    pub fn issue_pair(&self, subject: &str) -> AppResult<TokenPair> {
        let access_token = self.issue(subject, TokenKind::Access, Map::new(), None)?;
        let refresh_token = self.issue(subject, TokenKind::Refresh, Map::new(), None)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_token_expiry,
        })
    }

    /// Verify a token of the expected kind and return its claims
    ///
    /// # Errors
    /// Returns `AppError::InvalidToken` if the token is malformed, carries a
    /// bad signature, has expired, or is of the other kind
    pub fn verify(&self, token: &str, expected: TokenKind) -> AppResult<Claims> {
        self.check(token, expected).map_err(|reason| {
            debug!(kind = %expected, reason = %reason, "Token rejected");
            AppError::InvalidToken
        })
    }

    /// Verify a token and return only its subject
    #[must_use]
    pub fn extract_subject(&self, token: &str, expected: TokenKind) -> Option<String> {
        self.verify(token, expected).ok().map(|claims| claims.sub)
    }

    fn check(&self, token: &str, expected: TokenKind) -> Result<Claims, RejectReason> {
        let claims = decode::<Claims>(token, &self.keys(expected).decoding, &self.validation)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    RejectReason::BadSignature
                }
                _ => RejectReason::Malformed(e.to_string()),
            })?
            .claims;

        let now = self.clock.now().timestamp();
        if now >= claims.exp.saturating_add(self.leeway) {
            return Err(RejectReason::Expired {
                exp: claims.exp,
                now,
            });
        }

        match (expected, claims.kind) {
            (TokenKind::Access, TokenKind::Access) | (TokenKind::Refresh, TokenKind::Refresh) => {
                Ok(claims)
            }
            (expected, found) => Err(RejectReason::KindMismatch { expected, found }),
        }
    }
}

impl fmt::Debug for JwtService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtService")
            .field("access_token_expiry", &self.access_token_expiry)
            .field("refresh_token_expiry", &self.refresh_token_expiry)
            .field("leeway", &self.leeway)
            .finish_non_exhaustive()
    }
}
