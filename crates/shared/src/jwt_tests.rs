use super::*;
use chrono::{Duration, Utc};

fn create_test_service() -> JwtService {
    JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: 15,
        refresh_token_expires_days: 7,
    })
}

#[test]
fn test_claims_new_sets_correct_fields() {
    let expires_at = Utc::now() + Duration::hours(1);
    let claims = Claims::new(42, "student", TokenKind::Access, expires_at);

    assert_eq!(claims.sub, 42);
    assert_eq!(claims.user_id(), 42);
    assert_eq!(claims.role, "student");
    assert_eq!(claims.kind, TokenKind::Access);
    assert!(claims.iat <= Utc::now().timestamp());
    assert_eq!(claims.exp, expires_at.timestamp());
}

#[test]
fn test_access_token_roundtrip() {
    let service = create_test_service();

    let token = service.generate_access_token(7, "admin").unwrap();
    let claims = service.validate_token(&token).unwrap();

    assert_eq!(claims.user_id(), 7);
    assert_eq!(claims.role, "admin");
    assert_eq!(claims.kind, TokenKind::Access);
}

#[test]
fn test_refresh_token_has_refresh_kind() {
    let service = create_test_service();

    let token = service.generate_refresh_token(7, "guest").unwrap();
    let claims = service.validate_kind(&token, TokenKind::Refresh).unwrap();

    assert_eq!(claims.kind, TokenKind::Refresh);
    assert!(claims.exp > Utc::now().timestamp() + 6 * 86_400);
}

#[test]
fn test_access_token_rejected_as_refresh() {
    let service = create_test_service();

    let token = service.generate_access_token(7, "guest").unwrap();
    let result = service.validate_kind(&token, TokenKind::Refresh);

    assert!(matches!(
        result,
        Err(JwtError::WrongKind {
            expected: TokenKind::Refresh,
            actual: TokenKind::Access
        })
    ));
}

#[test]
fn test_expired_token() {
    let service = JwtService::new(JwtConfig {
        secret: "test-secret-key-for-testing".to_string(),
        access_token_expires_minutes: -10,
        refresh_token_expires_days: 7,
    });

    let token = service.generate_access_token(1, "guest").unwrap();
    assert!(matches!(service.validate_token(&token), Err(JwtError::Expired)));
}

#[test]
fn test_invalid_token() {
    let service = create_test_service();
    let result = service.validate_token("invalid.token.here");
    assert!(matches!(result, Err(JwtError::DecodingError(_))));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let other = JwtService::new(JwtConfig {
        secret: "another-secret".to_string(),
        ..JwtConfig::default()
    });
    let token = other.generate_access_token(1, "admin").unwrap();

    assert!(create_test_service().validate_token(&token).is_err());
}

#[test]
fn test_from_app_config() {
    let app = crate::config::JwtConfig {
        secret: "s".to_string(),
        access_token_expiry_secs: 3600,
        refresh_token_expiry_secs: 2_592_000,
    };
    let config = JwtConfig::from(&app);

    assert_eq!(config.access_token_expires_minutes, 60);
    assert_eq!(config.refresh_token_expires_days, 30);
    assert_eq!(JwtService::new(config).access_token_expires_in(), 3600);
}

#[test]
fn test_debug_hides_secret() {
    let debug = format!("{:?}", create_test_service());
    assert!(!debug.contains("test-secret-key-for-testing"));
    assert!(debug.contains("[hidden]"));
}
