//! # tally-common
//!
//! Authentication primitives shared by the tally services: password hashing,
//! dual-secret JWT issuance and verification, configuration, error handling
//! and telemetry.

pub mod auth;
pub mod config;
pub mod error;
pub mod telemetry;

// Re-export commonly used types at crate root
pub use auth::{
    hash_password, validate_password_strength, verify_password, Claims, Clock, JwtService,
    ManualClock, PasswordService, SystemClock, TokenKind, TokenPair,
};
pub use config::{
    AppSettings, AuthConfig, ConfigError, Environment, JwtConfig, SecretOrigin, SigningSecret,
};
pub use error::{AppError, AppResult, ErrorResponse};
pub use telemetry::{
    init_tracing, init_tracing_with_config, try_init_tracing, try_init_tracing_with_config,
    TracingConfig, TracingError,
};
