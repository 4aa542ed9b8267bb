//! End-to-end authentication flow tests
//!
//! Run with: cargo test -p integration-tests --test auth_flow_tests

use chrono::Duration;
use integration_tests::{
    config_from, AccountDirectory, Credentials, TestHarness, ACCESS_SECRET, REFRESH_SECRET,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::json;
use tally_common::{AppError, Clock, ConfigError, JwtService, SecretOrigin, TokenKind};
use tally_service::{AuthService, LoginRequest, RefreshTokenRequest};

// ============================================================================
// Token pair scenario
// ============================================================================

#[test]
fn test_alice_token_pair_lifecycle() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);

    let pair = service.create_token_pair("alice@example.com").unwrap();
    assert!(!pair.access_token.is_empty());
    assert!(!pair.refresh_token.is_empty());
    assert_ne!(pair.access_token, pair.refresh_token);

    assert_eq!(
        service.verify_token(&pair.access_token, TokenKind::Access),
        Some("alice@example.com".to_string())
    );
    assert_eq!(service.verify_token(&pair.refresh_token, TokenKind::Access), None);
    assert_eq!(service.verify_token(&pair.access_token, TokenKind::Refresh), None);

    // Past the 60 minute access lifetime, well within the 7 day refresh lifetime
    harness.clock.advance(Duration::minutes(61));

    assert_eq!(service.verify_token(&pair.access_token, TokenKind::Access), None);
    assert_eq!(
        service.verify_token(&pair.refresh_token, TokenKind::Refresh),
        Some("alice@example.com".to_string())
    );
}

#[test]
fn test_refresh_after_access_expiry() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);
    let pair = service.create_token_pair("alice@example.com").unwrap();

    harness.clock.advance(Duration::hours(3));
    let renewed = service
        .refresh_tokens(RefreshTokenRequest::new(pair.refresh_token.clone()))
        .unwrap();

    assert_eq!(
        service.verify_token(&renewed.access_token, TokenKind::Access),
        Some("alice@example.com".to_string())
    );

    // Once the refresh token itself expires there is no way back in
    harness.clock.advance(Duration::days(7));
    let result = service.refresh_tokens(RefreshTokenRequest::new(pair.refresh_token));
    assert!(matches!(result, Err(AppError::InvalidToken)));
}

// ============================================================================
// Login flow
// ============================================================================

#[tokio::test]
async fn test_register_then_login() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);
    let accounts = AccountDirectory::new();
    let creds = Credentials::unique();

    let digest = service
        .register_password(creds.password.clone())
        .await
        .unwrap();
    accounts.insert(&creds.email, digest);

    let response = service
        .login(
            LoginRequest::new(creds.email.clone(), creds.password.clone()),
            accounts.digest_for(&creds.email),
        )
        .await
        .unwrap();

    assert_eq!(response.subject, creds.email);
    let header = format!("Bearer {}", response.access_token);
    assert_eq!(
        service.subject_from_authorization(Some(&header)).unwrap(),
        creds.email
    );
}

#[tokio::test]
async fn test_login_failures_report_invalid_credentials() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);
    let accounts = AccountDirectory::new();
    let creds = Credentials::unique();

    let digest = service.hash_password(creds.password.clone()).await.unwrap();
    accounts.insert(&creds.email, digest);

    let wrong_password = service
        .login(
            LoginRequest::new(creds.email.clone(), "WrongPass123!"),
            accounts.digest_for(&creds.email),
        )
        .await;
    let unknown = Credentials::unique();
    let unknown_user = service
        .login(
            LoginRequest::new(unknown.email.clone(), unknown.password),
            accounts.digest_for(&unknown.email),
        )
        .await;

    for result in [wrong_password, unknown_user] {
        let err = result.unwrap_err();
        assert!(matches!(err, AppError::InvalidCredentials));
        assert!(err.is_auth_failure());
    }
}

#[tokio::test]
async fn test_hashes_are_salted() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);

    let first = service.hash_password("hunter2".to_string()).await.unwrap();
    let second = service.hash_password("hunter2".to_string()).await.unwrap();

    assert_ne!(first, second);
    assert!(service.verify_password("hunter2".to_string(), first).await);
    assert!(service.verify_password("hunter2".to_string(), second.clone()).await);
    assert!(!service.verify_password("hunter3".to_string(), second).await);
}

// ============================================================================
// Token verification edge cases
// ============================================================================

#[test]
fn test_foreign_secret_is_rejected() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);
    let exp = harness.clock.now().timestamp() + 600;

    let forged = encode(
        &Header::default(),
        &json!({ "sub": "alice@example.com", "exp": exp, "type": "access" }),
        &EncodingKey::from_secret(b"secret-a"),
    )
    .unwrap();
    assert_eq!(service.verify_token(&forged, TokenKind::Access), None);

    // The same claims signed with the configured access secret verify
    let genuine = encode(
        &Header::default(),
        &json!({ "sub": "alice@example.com", "exp": exp, "type": "access" }),
        &EncodingKey::from_secret(ACCESS_SECRET.as_bytes()),
    )
    .unwrap();
    assert_eq!(
        service.verify_token(&genuine, TokenKind::Access),
        Some("alice@example.com".to_string())
    );
}

#[test]
fn test_refresh_secret_does_not_sign_access_tokens() {
    let harness = TestHarness::start().unwrap();
    let service = AuthService::new(&harness.ctx);
    let exp = harness.clock.now().timestamp() + 600;

    let token = encode(
        &Header::default(),
        &json!({ "sub": "alice@example.com", "exp": exp, "type": "access" }),
        &EncodingKey::from_secret(REFRESH_SECRET.as_bytes()),
    )
    .unwrap();

    assert_eq!(service.verify_token(&token, TokenKind::Access), None);
    assert_eq!(service.verify_token(&token, TokenKind::Refresh), None);
}

#[test]
fn test_tokens_do_not_survive_secret_rotation() {
    let before = TestHarness::start().unwrap();
    let pair = AuthService::new(&before.ctx)
        .create_token_pair("alice@example.com")
        .unwrap();

    // A restart with generated secrets
    let after = TestHarness::with_vars(&[]).unwrap();
    assert!(after.ctx.config().uses_generated_secrets());

    let service = AuthService::new(&after.ctx);
    assert_eq!(service.verify_token(&pair.access_token, TokenKind::Access), None);
    assert_eq!(service.verify_token(&pair.refresh_token, TokenKind::Refresh), None);
}

#[test]
fn test_expired_by_one_second() {
    let harness = TestHarness::start().unwrap();
    let jwt: &JwtService = harness.ctx.jwt_service();

    let token = jwt
        .issue(
            "alice@example.com",
            TokenKind::Access,
            serde_json::Map::new(),
            Some(Duration::seconds(-1)),
        )
        .unwrap();

    assert!(jwt.extract_subject(&token, TokenKind::Access).is_none());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_identical_secrets_prevent_startup() {
    let result = config_from(&[("SECRET_KEY", "shared"), ("REFRESH_SECRET_KEY", "shared")]);
    assert!(matches!(result, Err(ConfigError::IdenticalSecrets)));
}

#[test]
fn test_production_requires_secrets() {
    let result = config_from(&[("APP_ENV", "production")]);
    assert!(matches!(result, Err(ConfigError::MissingVar("SECRET_KEY"))));

    let config = config_from(&[
        ("APP_ENV", "production"),
        ("SECRET_KEY", ACCESS_SECRET),
        ("REFRESH_SECRET_KEY", REFRESH_SECRET),
    ])
    .unwrap();
    assert_eq!(config.jwt.access_secret.origin(), SecretOrigin::Provided);
    assert!(config.app.env.is_production());
}

#[test]
fn test_misspelled_environment_prevents_startup() {
    let result = config_from(&[("APP_ENV", "prod")]);
    assert!(matches!(result, Err(ConfigError::InvalidValue("APP_ENV", _))));
}

#[test]
fn test_oversized_refresh_lifetime_prevents_startup() {
    let result = config_from(&[
        ("SECRET_KEY", ACCESS_SECRET),
        ("REFRESH_SECRET_KEY", REFRESH_SECRET),
        ("REFRESH_TOKEN_EXPIRE_DAYS", "200000000"),
    ]);
    assert!(matches!(
        result,
        Err(ConfigError::InvalidValue("REFRESH_TOKEN_EXPIRE_DAYS", _))
    ));
}
