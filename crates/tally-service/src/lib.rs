//! # tally-service
//!
//! Application layer exposing the authentication contract to the rest of
//! tally: `hash_password`, `verify_password`, `login`, `create_token_pair`,
//! `verify_token` and `refresh_tokens`.

pub mod dto;
pub mod services;

pub use dto::{AuthResponse, LoginRequest, RefreshTokenRequest};
pub use services::{AuthService, ServiceContext};
