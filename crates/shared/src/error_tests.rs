use super::*;
use rstest::rstest;

#[rstest]
#[case(AppError::Unauthorized("test".into()), 401, "unauthorized")]
#[case(AppError::Forbidden("test".into()), 403, "forbidden")]
#[case(AppError::NotFound("test".into()), 404, "not_found")]
#[case(AppError::Validation("test".into()), 400, "validation_error")]
#[case(AppError::Conflict("test".into()), 409, "conflict")]
#[case(AppError::Database("test".into()), 500, "database_error")]
#[case(AppError::Storage("test".into()), 500, "storage_error")]
#[case(AppError::ServiceUnavailable("test".into()), 503, "service_unavailable")]
#[case(AppError::Internal("test".into()), 500, "internal_error")]
fn test_app_error_mapping(#[case] error: AppError, #[case] status: u16, #[case] code: &str) {
    assert_eq!(error.status_code(), status);
    assert_eq!(error.error_code(), code);
}

#[test]
fn test_server_errors() {
    assert!(AppError::Database("x".into()).is_server_error());
    assert!(AppError::ServiceUnavailable("x".into()).is_server_error());
    assert!(!AppError::Conflict("x".into()).is_server_error());
    assert!(!AppError::Validation("x".into()).is_server_error());
}

#[test]
fn test_app_error_display() {
    assert_eq!(
        format!("{}", AppError::Unauthorized("msg".into())),
        "Authentication failed: msg"
    );
    assert_eq!(
        format!("{}", AppError::Forbidden("msg".into())),
        "Access denied: msg"
    );
    assert_eq!(
        format!("{}", AppError::NotFound("msg".into())),
        "Not found: msg"
    );
    assert_eq!(
        format!("{}", AppError::Storage("msg".into())),
        "Storage error: msg"
    );
}
