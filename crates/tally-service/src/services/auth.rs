//! Authentication service
//!
//! The surface the rest of the application calls: password hashing and
//! verification, login, token pair issuance, token verification and refresh.
//! User lookup stays with the caller, which passes in the stored digest.

use tally_common::auth::{validate_password_strength, TokenKind, TokenPair};
use tally_common::{AppError, AppResult};
use tracing::{error, info, instrument, warn};

use crate::dto::{AuthResponse, LoginRequest, RefreshTokenRequest};

use super::context::ServiceContext;

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication service
pub struct AuthService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AuthService<'a> {
    /// Create a new AuthService
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Hash a password on the blocking pool
    #[instrument(skip_all)]
    pub async fn hash_password(&self, password: String) -> AppResult<String> {
        let hasher = self.ctx.password_service();

        tokio::task::spawn_blocking(move || hasher.hash(&password))
            .await
            .map_err(AppError::internal)?
    }

    /// Check password strength, then hash it for storage
    #[instrument(skip_all)]
    pub async fn register_password(&self, password: String) -> AppResult<String> {
        validate_password_strength(&password)?;
        self.hash_password(password).await
    }

    /// Verify a password against a stored digest on the blocking pool
    #[instrument(skip_all)]
    pub async fn verify_password(&self, password: String, digest: String) -> bool {
        let hasher = self.ctx.password_service();

        match tokio::task::spawn_blocking(move || hasher.verify(&password, &digest)).await {
            Ok(valid) => valid,
            Err(e) => {
                error!(error = %e, "Password verification task failed");
                false
            }
        }
    }

    /// Login with email and password
    ///
    /// `stored_digest` is `None` when no account exists for the email. A decoy
    /// digest is verified in that case so both failures take the same time.
    #[instrument(skip(self, request, stored_digest), fields(email = %request.email))]
    pub async fn login(
        &self,
        request: LoginRequest,
        stored_digest: Option<String>,
    ) -> AppResult<AuthResponse> {
        let LoginRequest { email, password } = request;

        let (digest, known_user) = match stored_digest {
            Some(digest) => (digest, true),
            None => (self.ctx.decoy_digest().to_string(), false),
        };

        let is_valid = self.verify_password(password, digest).await;

        if !known_user {
            warn!("Login failed: user not found");
            return Err(AppError::InvalidCredentials);
        }
        if !is_valid {
            warn!("Login failed: invalid password");
            return Err(AppError::InvalidCredentials);
        }

        let token_pair = self.create_token_pair(&email)?;

        info!("User logged in successfully");

        Ok(AuthResponse::new(token_pair, email))
    }

    /// Issue an access/refresh token pair for a subject
    pub fn create_token_pair(&self, subject: &str) -> AppResult<TokenPair> {
        self.ctx.jwt_service().issue_pair(subject)
    }

    /// Verify a token of the expected kind and return its subject
    pub fn verify_token(&self, token: &str, expected: TokenKind) -> Option<String> {
        self.ctx.jwt_service().extract_subject(token, expected)
    }

    /// Exchange a still-valid refresh token for a new token pair
    #[instrument(skip_all)]
    pub fn refresh_tokens(&self, request: RefreshTokenRequest) -> AppResult<AuthResponse> {
        let claims = self
            .ctx
            .jwt_service()
            .verify(&request.refresh_token, TokenKind::Refresh)?;

        let token_pair = self.create_token_pair(&claims.sub)?;

        info!(subject = %claims.sub, "Tokens refreshed successfully");

        Ok(AuthResponse::new(token_pair, claims.sub))
    }

    /// Resolve the subject of an `Authorization: Bearer <access token>` header
    pub fn subject_from_authorization(&self, header: Option<&str>) -> AppResult<String> {
        let header = header.ok_or(AppError::MissingAuth)?;

        let token = header
            .strip_prefix(BEARER_PREFIX)
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AppError::InvalidToken)?;

        self.ctx
            .jwt_service()
            .verify(token, TokenKind::Access)
            .map(|claims| claims.sub)
    }
}
