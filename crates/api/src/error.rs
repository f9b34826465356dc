//! HTTP error responses.
//!
//! Every handler error becomes `{"error": code, "message": text}` with a
//! matching status. Server-side failures are logged here and reach the
//! client only as a generic message.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

use campus_core::attachment::{AttachmentError, AttachmentErrorKind};
use campus_core::auth::PasswordError;
use campus_db::repositories::{EventError, ForumError, LessonError, QuestionError, UserError};
use campus_shared::{AppError, JwtError};

const INTERNAL_MESSAGE: &str = "An internal error occurred";

/// An error ready to be rendered as an HTTP response.
#[derive(Debug, Clone)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl ApiError {
    /// Creates an error with an explicit status, code and message.
    #[must_use]
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with a specific code.
    #[must_use]
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    /// 400 `validation_error`.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::bad_request("validation_error", message)
    }

    /// 401 with a specific code.
    #[must_use]
    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, code, message)
    }

    /// 403 `forbidden`.
    #[must_use]
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(StatusCode::FORBIDDEN, "forbidden", message)
    }

    /// 404 with a specific code.
    #[must_use]
    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    /// 503 returned by routes that need object storage when none is configured.
    #[must_use]
    pub fn storage_not_configured() -> Self {
        Self::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "storage_not_configured",
            "File storage is not configured on this server",
        )
    }

    /// 500 with a generic message. `cause` is logged, never returned.
    #[must_use]
    pub fn internal(cause: &dyn std::fmt::Display) -> Self {
        error!(error = %cause, "Internal error");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            INTERNAL_MESSAGE,
        )
    }

    /// HTTP status.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        let status = StatusCode::from_u16(err.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if err.is_server_error() {
            error!(error = %err, "Application error");
            return Self::new(status, err.error_code(), INTERNAL_MESSAGE);
        }
        Self::new(status, err.error_code(), err.to_string())
    }
}

impl From<AttachmentError> for ApiError {
    fn from(err: AttachmentError) -> Self {
        let status = match err.kind() {
            AttachmentErrorKind::Validation => StatusCode::BAD_REQUEST,
            AttachmentErrorKind::NotFound => StatusCode::NOT_FOUND,
            AttachmentErrorKind::Storage | AttachmentErrorKind::Persist => {
                let source = std::error::Error::source(&err).map(ToString::to_string);
                error!(
                    code = err.code(),
                    error = %err,
                    source = source.as_deref().unwrap_or("-"),
                    "Attachment operation failed"
                );
                return Self::new(StatusCode::INTERNAL_SERVER_ERROR, err.code(), INTERNAL_MESSAGE);
            }
        };
        Self::new(status, err.code(), err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::DuplicateEmail(_) => {
                Self::new(StatusCode::CONFLICT, "email_taken", err.to_string())
            }
            UserError::NotFound(_) => Self::not_found("user_not_found", err.to_string()),
            UserError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<ForumError> for ApiError {
    fn from(err: ForumError) -> Self {
        match err {
            ForumError::DuplicateTitle(_) => {
                Self::new(StatusCode::CONFLICT, "duplicate_title", err.to_string())
            }
            ForumError::DuplicateClusterName(_) => {
                Self::new(StatusCode::CONFLICT, "duplicate_cluster_name", err.to_string())
            }
            ForumError::PostNotFound(_) => Self::not_found("post_not_found", err.to_string()),
            ForumError::ReplyNotFound(_) => Self::not_found("reply_not_found", err.to_string()),
            ForumError::ClusterNotFound(_) => {
                Self::not_found("cluster_not_found", err.to_string())
            }
            ForumError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<EventError> for ApiError {
    fn from(err: EventError) -> Self {
        match err {
            EventError::NotFound(_) => Self::not_found("event_not_found", err.to_string()),
            EventError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<LessonError> for ApiError {
    fn from(err: LessonError) -> Self {
        match err {
            LessonError::DuplicateCategoryName(_) => {
                Self::new(StatusCode::CONFLICT, "duplicate_category_name", err.to_string())
            }
            LessonError::CategoryNotEmpty(_) => {
                Self::new(StatusCode::CONFLICT, "category_not_empty", err.to_string())
            }
            LessonError::CategoryNotFound(_) => {
                Self::not_found("category_not_found", err.to_string())
            }
            LessonError::LessonNotFound(_) => Self::not_found("lesson_not_found", err.to_string()),
            LessonError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<QuestionError> for ApiError {
    fn from(err: QuestionError) -> Self {
        match err {
            QuestionError::QuestionNotFound(_) => {
                Self::not_found("question_not_found", err.to_string())
            }
            QuestionError::AnswerNotFound(_) => {
                Self::not_found("answer_not_found", err.to_string())
            }
            QuestionError::Database(e) => Self::internal(&e),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        Self::internal(&err)
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort | PasswordError::TooLong => {
                Self::bad_request("weak_password", err.to_string())
            }
            PasswordError::HashError(_)
            | PasswordError::VerifyError(_)
            | PasswordError::InvalidHash => Self::internal(&err),
        }
    }
}

impl From<JwtError> for ApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => Self::unauthorized("token_expired", "Token has expired"),
            JwtError::WrongKind { .. } => {
                Self::unauthorized("wrong_token_kind", err.to_string())
            }
            JwtError::DecodingError(_) => {
                Self::unauthorized("invalid_token", "Invalid or malformed token")
            }
            JwtError::EncodingError(_) => Self::internal(&err),
        }
    }
}
