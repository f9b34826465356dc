//! Authentication types for JWT and tokens.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Distinguishes short-lived access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    /// Presented on every authenticated request.
    Access,
    /// Exchanged for a new access token.
    Refresh,
}

/// JWT claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: i64,
    /// User's role at issue time.
    pub role: String,
    /// Token kind.
    pub kind: TokenKind,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: i64, role: &str, kind: TokenKind, expires_at: DateTime<Utc>) -> Self {
        let now = Utc::now();
        Self {
            sub: user_id,
            role: role.to_string(),
            kind,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from claims.
    #[must_use]
    pub const fn user_id(&self) -> i64 {
        self.sub
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// Requested role: `guest`, `student`, or `admin`.
    pub role: String,
    /// Class cycle, required for students.
    #[serde(default)]
    pub class_cycle: Option<i32>,
}

/// Public user info returned by auth and user endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: i64,
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// User email.
    pub email: String,
    /// Class cycle.
    pub class_cycle: Option<i32>,
    /// Role name.
    pub role: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Access token.
    pub access_token: String,
    /// Refresh token.
    pub refresh_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

/// Refresh token request.
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshRequest {
    /// The refresh token.
    pub refresh_token: String,
}

/// Refresh token response.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    /// New access token.
    pub access_token: String,
    /// Access token expiration in seconds.
    pub expires_in: i64,
}

/// Profile update request. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProfileRequest {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New class cycle.
    pub class_cycle: Option<i32>,
    /// New password.
    pub password: Option<String>,
}

/// Role assignment request.
#[derive(Debug, Clone, Deserialize)]
pub struct AssignRoleRequest {
    /// Role name: `guest`, `student`, `staff`, or `admin`.
    pub role: String,
}
