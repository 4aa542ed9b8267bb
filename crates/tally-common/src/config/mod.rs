//! Configuration structs

mod app_config;
mod secret;

pub use app_config::{
    AppSettings, AuthConfig, ConfigError, Environment, JwtConfig, ACCESS_EXPIRY_VAR,
    ACCESS_SECRET_VAR, APP_ENV_VAR, LEEWAY_VAR, MAX_TOKEN_LIFETIME_SECONDS, REFRESH_EXPIRY_VAR,
    REFRESH_SECRET_VAR,
};
pub use secret::{SecretOrigin, SigningSecret};
