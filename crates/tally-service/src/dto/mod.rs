//! Data transfer objects for auth requests and responses

pub mod requests;
pub mod responses;

pub use requests::{LoginRequest, RefreshTokenRequest};
pub use responses::AuthResponse;
