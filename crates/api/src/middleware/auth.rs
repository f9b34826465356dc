//! Authentication middleware for protected routes.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::{IntoResponse, Response},
};

use campus_core::auth::UserRole;
use campus_shared::types::UserId;
use campus_shared::{Claims, TokenKind};

use crate::{AppState, error::ApiError};

/// Extracts the bearer token from the Authorization header.
fn extract_bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
}

/// Authentication middleware that validates JWT access tokens.
///
/// This middleware:
/// 1. Extracts the Bearer token from the Authorization header
/// 2. Validates it as an access token (refresh tokens are rejected)
/// 3. Stores an [`AuthUser`] in request extensions for handlers to access
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(token) = auth_header.and_then(extract_bearer_token) else {
        return ApiError::unauthorized(
            "missing_token",
            "Authorization header with Bearer token is required",
        )
        .into_response();
    };

    let claims = match state.jwt_service.validate_kind(token, TokenKind::Access) {
        Ok(claims) => claims,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let Ok(role) = claims.role.parse::<UserRole>() else {
        return ApiError::unauthorized("invalid_token", "Token carries an unknown role")
            .into_response();
    };

    request.extensions_mut().insert(AuthUser { claims, role });
    next.run(request).await
}

/// The authenticated caller.
///
/// Use this in handlers behind [`auth_middleware`]:
///
/// ```ignore
/// async fn handler(auth: AuthUser) -> impl IntoResponse {
///     let user_id = auth.user_id();
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    claims: Claims,
    role: UserRole,
}

impl AuthUser {
    /// Returns the user ID from the claims.
    #[must_use]
    pub fn user_id(&self) -> UserId {
        UserId::new(self.claims.user_id())
    }

    /// Returns the user's role at token issue time.
    #[must_use]
    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Returns the inner claims.
    #[must_use]
    pub const fn claims(&self) -> &Claims {
        &self.claims
    }

    /// True if the caller owns the resource or is an admin.
    #[must_use]
    pub fn may_modify(&self, owner: UserId) -> bool {
        self.role.may_modify(self.user_id(), owner)
    }

    /// Fails with 403 unless the caller owns the resource or is an admin.
    ///
    /// # Errors
    ///
    /// Returns a `forbidden` error.
    pub fn require_owner_or_admin(&self, owner: UserId) -> Result<(), ApiError> {
        if self.may_modify(owner) {
            Ok(())
        } else {
            Err(ApiError::forbidden(
                "Only the author or an admin may modify this resource",
            ))
        }
    }

    /// Fails with 403 unless the caller is an admin.
    ///
    /// # Errors
    ///
    /// Returns a `forbidden` error.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden("Admin role required"))
        }
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("unauthorized", "Authentication required"))
    }
}
