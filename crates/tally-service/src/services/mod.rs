//! Business logic services

pub mod auth;
pub mod context;

pub use auth::AuthService;
pub use context::ServiceContext;
