//! Response DTOs

use serde::Serialize;
use tally_common::TokenPair;

/// Authentication response
#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: i64,
    /// Identity the tokens were issued to
    pub subject: String,
}

impl AuthResponse {
    pub fn new(pair: TokenPair, subject: impl Into<String>) -> Self {
        Self {
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
            token_type: pair.token_type,
            expires_in: pair.expires_in,
            subject: subject.into(),
        }
    }
}
