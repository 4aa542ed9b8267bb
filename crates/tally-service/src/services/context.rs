//! Service context - dependency container for services
//!
//! Built once at startup from an [`AuthConfig`] and cloned cheaply into
//! request handlers.

use std::sync::Arc;

use tally_common::auth::{Clock, JwtService, PasswordService, SystemClock};
use tally_common::{AppResult, AuthConfig, SigningSecret};

/// Service context containing all dependencies
#[derive(Clone)]
pub struct ServiceContext {
    config: Arc<AuthConfig>,
    jwt_service: Arc<JwtService>,
    password_service: PasswordService,
    // Digest checked when a login names an unknown user
    decoy_digest: Arc<str>,
}

impl ServiceContext {
    /// Create a new service context reading the wall clock
    ///
    /// # Errors
    /// Returns an error if the decoy digest cannot be computed
    pub fn new(config: AuthConfig) -> AppResult<Self> {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a new service context with a custom time source
    ///
    /// # Errors
    /// Returns an error if the decoy digest cannot be computed
    pub fn with_clock(config: AuthConfig, clock: Arc<dyn Clock>) -> AppResult<Self> {
        let password_service = PasswordService::new();
        let jwt_service = JwtService::with_clock(&config.jwt, clock);

        // Hash of an unguessable value; only its verification cost matters
        let decoy = SigningSecret::generate();
        let decoy_digest = password_service.hash(&String::from_utf8_lossy(decoy.as_bytes()))?;

        Ok(Self {
            config: Arc::new(config),
            jwt_service: Arc::new(jwt_service),
            password_service,
            decoy_digest: decoy_digest.into(),
        })
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn password_service(&self) -> PasswordService {
        self.password_service
    }

    pub(crate) fn decoy_digest(&self) -> &str {
        &self.decoy_digest
    }
}
