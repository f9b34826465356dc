//! Authentication routes for login, register, and token refresh.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use tracing::info;

use campus_core::auth::{
    UnknownRole, UserRole, check_password_policy, hash_password, verify_password,
};
use campus_db::UserRepository;
use campus_db::repositories::{CreateUserInput, role_of};
use campus_shared::TokenKind;
use campus_shared::auth::{
    LoginRequest, LoginResponse, RefreshRequest, RefreshResponse, RegisterRequest,
};
use campus_shared::config::AuthConfig;
use campus_shared::types::UserId;

use crate::{AppState, error::ApiError, routes::users::user_info};

/// Creates the auth router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/refresh", post(refresh))
}

fn invalid_credentials() -> ApiError {
    ApiError::unauthorized("invalid_credentials", "Invalid email or password")
}

/// Lowercases and trims an email address.
pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_ascii_lowercase()
}

/// Rejects obviously malformed email addresses.
pub(crate) fn validate_email(email: &str) -> Result<(), ApiError> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(ApiError::validation("A valid email address is required")),
    }
}

/// Rejects an empty or whitespace-only name.
pub(crate) fn validate_name(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(format!("{field} is required")));
    }
    Ok(())
}

/// Checks everything about a registration that does not need the database.
///
/// Returns the parsed role and the normalized email.
fn validate_registration(
    payload: &RegisterRequest,
    auth: &AuthConfig,
) -> Result<(UserRole, String), ApiError> {
    let role: UserRole = payload
        .role
        .parse()
        .map_err(|e: UnknownRole| ApiError::bad_request("invalid_role", e.to_string()))?;

    if !role.can_self_register() {
        return Err(ApiError::bad_request(
            "role_not_allowed",
            format!("The {role} role is assigned by an admin"),
        ));
    }

    validate_name("first_name", &payload.first_name)?;
    validate_name("last_name", &payload.last_name)?;

    let email = normalize_email(&payload.email);
    validate_email(&email)?;

    if role.is_admin() && !auth.is_admin_email(&email) {
        return Err(ApiError::bad_request(
            "admin_not_allowed",
            "This email may not register as an admin",
        ));
    }

    if role.requires_class_cycle() && payload.class_cycle.is_none() {
        return Err(ApiError::bad_request(
            "class_cycle_required",
            "Students must provide a class cycle",
        ));
    }

    check_password_policy(&payload.password)?;

    Ok((role, email))
}

/// POST /auth/register - Create a new account.
async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let (role, email) = validate_registration(&payload, &state.auth)?;
    let password_hash = hash_password(&payload.password)?;

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .create(CreateUserInput {
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            email,
            password_hash,
            class_cycle: if role.requires_class_cycle() {
                payload.class_cycle
            } else {
                None
            },
            role,
        })
        .await?;

    info!(user_id = %user.id, role = %role, "User registered");

    Ok((StatusCode::CREATED, Json(user_info(&user))))
}

/// POST /auth/login - Authenticate user and return tokens.
async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&payload.email);
    let user_repo = UserRepository::new((*state.db).clone());

    let Some(user) = user_repo.find_by_email(&email).await? else {
        info!(email = %email, "Login attempt for non-existent user");
        return Err(invalid_credentials());
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        info!(user_id = %user.id, "Failed login attempt - invalid password");
        return Err(invalid_credentials());
    }

    let role = role_of(&user);
    let access_token = state
        .jwt_service
        .generate_access_token(user.id, role.as_str())?;
    let refresh_token = state
        .jwt_service
        .generate_refresh_token(user.id, role.as_str())?;

    info!(user_id = %user.id, "User logged in");

    Ok(Json(LoginResponse {
        user: user_info(&user),
        access_token,
        refresh_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}

/// POST /auth/refresh - Exchange a refresh token for a new access token.
///
/// The role is re-read so that role changes apply from the next refresh.
async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .jwt_service
        .validate_kind(&payload.refresh_token, TokenKind::Refresh)?;

    let user_repo = UserRepository::new((*state.db).clone());
    let Some(user) = user_repo.find_by_id(UserId::new(claims.user_id())).await? else {
        return Err(ApiError::unauthorized(
            "invalid_token",
            "Token subject no longer exists",
        ));
    };

    let access_token = state
        .jwt_service
        .generate_access_token(user.id, role_of(&user).as_str())?;

    Ok(Json(RefreshResponse {
        access_token,
        expires_in: state.jwt_service.access_token_expires_in(),
    }))
}
