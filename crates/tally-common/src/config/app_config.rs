//! Application configuration structs
//!
//! Loads configuration from environment variables once at startup. The
//! resulting [`AuthConfig`] is immutable and handed to the services.

use std::env;
use std::str::FromStr;

use serde::de::value::Error as ValueError;
use serde::de::IntoDeserializer;
use serde::Deserialize;
use tracing::{info, warn};

use super::secret::{SecretOrigin, SigningSecret};

pub const ACCESS_SECRET_VAR: &str = "SECRET_KEY";
pub const REFRESH_SECRET_VAR: &str = "REFRESH_SECRET_KEY";
pub const ACCESS_EXPIRY_VAR: &str = "ACCESS_TOKEN_EXPIRE_MINUTES";
pub const REFRESH_EXPIRY_VAR: &str = "REFRESH_TOKEN_EXPIRE_DAYS";
pub const LEEWAY_VAR: &str = "TOKEN_LEEWAY_SECONDS";
pub const APP_ENV_VAR: &str = "APP_ENV";

const SECONDS_PER_MINUTE: i64 = 60;
const SECONDS_PER_DAY: i64 = 86_400;

/// Longest lifetime a token kind may be configured with (ten years)
pub const MAX_TOKEN_LIFETIME_SECONDS: i64 = 3650 * SECONDS_PER_DAY;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub app: AppSettings,
    pub jwt: JwtConfig,
}

/// General application settings
#[derive(Debug, Clone)]
pub struct AppSettings {
    pub name: String,
    pub env: Environment,
}

/// Environment type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    #[must_use]
    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }

    #[must_use]
    pub fn is_development(&self) -> bool {
        matches!(self, Self::Development)
    }

    /// Random secret generation is only permitted outside production
    #[must_use]
    pub fn allows_generated_secrets(&self) -> bool {
        !self.is_production()
    }
}

impl FromStr for Environment {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::deserialize(lowered.as_str().into_deserializer())
    }
}

/// JWT signing configuration
///
/// Lifetimes and leeway are in seconds.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_secret: SigningSecret,
    pub refresh_secret: SigningSecret,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    /// Grace window applied to the expiry check. Zero means a token is
    /// rejected from the second its `exp` is reached.
    pub leeway: i64,
}

impl JwtConfig {
    /// Build a validated JWT configuration with zero leeway
    ///
    /// # Errors
    /// Returns an error if a secret is empty, the secrets are equal, or a
    /// lifetime is outside `1..=MAX_TOKEN_LIFETIME_SECONDS`
    pub fn new(
        access_secret: SigningSecret,
        refresh_secret: SigningSecret,
        access_token_expiry: i64,
        refresh_token_expiry: i64,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            access_secret,
            refresh_secret,
            access_token_expiry,
            refresh_token_expiry,
            leeway: 0,
        };
        config.validate()?;
        Ok(config)
    }

    /// Set the expiry leeway in seconds
    ///
    /// # Errors
    /// Returns an error if the leeway is negative
    pub fn with_leeway(mut self, leeway: i64) -> Result<Self, ConfigError> {
        if leeway < 0 {
            return Err(ConfigError::InvalidValue(LEEWAY_VAR, leeway.to_string()));
        }
        self.leeway = leeway;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.access_secret.is_empty() {
            return Err(ConfigError::EmptySecret(ACCESS_SECRET_VAR));
        }
        if self.refresh_secret.is_empty() {
            return Err(ConfigError::EmptySecret(REFRESH_SECRET_VAR));
        }
        if self.access_secret.as_bytes() == self.refresh_secret.as_bytes() {
            return Err(ConfigError::IdenticalSecrets);
        }
        check_lifetime(ACCESS_EXPIRY_VAR, self.access_token_expiry)?;
        check_lifetime(REFRESH_EXPIRY_VAR, self.refresh_token_expiry)
    }
}

fn check_lifetime(key: &'static str, seconds: i64) -> Result<(), ConfigError> {
    if (1..=MAX_TOKEN_LIFETIME_SECONDS).contains(&seconds) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue(key, seconds.to_string()))
    }
}

// Default value functions
fn default_app_name() -> String {
    "tally".to_string()
}

fn default_access_token_minutes() -> i64 {
    60
}

fn default_refresh_token_days() -> i64 {
    7
}

fn default_leeway() -> i64 {
    0
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// A `.env` file is read first if present.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or, in production,
    /// a signing secret is missing
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Errors
    /// See [`AuthConfig::from_env`]
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = parse_var(&lookup, APP_ENV_VAR, Environment::default())?;

        let access_minutes = parse_var(&lookup, ACCESS_EXPIRY_VAR, default_access_token_minutes())?;
        let refresh_days = parse_var(&lookup, REFRESH_EXPIRY_VAR, default_refresh_token_days())?;
        let leeway = parse_var(&lookup, LEEWAY_VAR, default_leeway())?;

        let access_secret = resolve_secret(lookup(ACCESS_SECRET_VAR), ACCESS_SECRET_VAR, env)?;
        let refresh_secret = resolve_secret(lookup(REFRESH_SECRET_VAR), REFRESH_SECRET_VAR, env)?;

        let jwt = JwtConfig::new(
            access_secret,
            refresh_secret,
            access_minutes.saturating_mul(SECONDS_PER_MINUTE),
            refresh_days.saturating_mul(SECONDS_PER_DAY),
        )?
        .with_leeway(leeway)?;

        info!(
            env = ?env,
            access_token_expiry = jwt.access_token_expiry,
            refresh_token_expiry = jwt.refresh_token_expiry,
            leeway = jwt.leeway,
            "Auth configuration loaded"
        );

        Ok(Self {
            app: AppSettings {
                name: lookup("APP_NAME").unwrap_or_else(default_app_name),
                env,
            },
            jwt,
        })
    }

    /// True if either signing secret was generated at startup
    #[must_use]
    pub fn uses_generated_secrets(&self) -> bool {
        self.jwt.access_secret.origin() == SecretOrigin::Generated
            || self.jwt.refresh_secret.origin() == SecretOrigin::Generated
    }
}

fn parse_var<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => Ok(value),
            Err(_) => Err(ConfigError::InvalidValue(key, raw)),
        },
        None => Ok(default),
    }
}

fn resolve_secret(
    value: Option<String>,
    key: &'static str,
    env: Environment,
) -> Result<SigningSecret, ConfigError> {
    match value.filter(|s| !s.trim().is_empty()) {
        Some(secret) => Ok(SigningSecret::new(secret)),
        None if env.allows_generated_secrets() => {
            warn!(
                var = key,
                "Signing secret not set, generating a random one; issued tokens will not survive a restart"
            );
            Ok(SigningSecret::generate())
        }
        None => Err(ConfigError::MissingVar(key)),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),

    #[error("Signing secret {0} must not be empty")]
    EmptySecret(&'static str),

    #[error("Access and refresh signing secrets must differ")]
    IdenticalSecrets,
}
