//! User profile and role management routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    response::IntoResponse,
    routing::{get, put},
};
use tracing::info;

use campus_core::auth::{UnknownRole, UserRole, check_password_policy, hash_password};
use campus_db::UserRepository;
use campus_db::entities::users;
use campus_db::repositories::{UpdateUserInput, role_of};
use campus_shared::auth::{AssignRoleRequest, UpdateProfileRequest, UserInfo};
use campus_shared::types::UserId;

use crate::{
    AppState,
    error::ApiError,
    middleware::AuthUser,
    routes::auth::{normalize_email, validate_email, validate_name},
};

/// Creates the user routes. All of them require authentication.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/me", get(get_me))
        .route("/users/{id}", get(get_user).put(update_user))
        .route("/users/{id}/role", put(assign_role))
}

/// Public view of a stored user.
pub(crate) fn user_info(user: &users::Model) -> UserInfo {
    UserInfo {
        id: user.id,
        first_name: user.first_name.clone(),
        last_name: user.last_name.clone(),
        email: user.email.clone(),
        class_cycle: user.class_cycle,
        role: role_of(user).as_str().to_string(),
    }
}

/// Validates a profile update and turns it into repository input.
fn profile_update(payload: UpdateProfileRequest) -> Result<UpdateUserInput, ApiError> {
    if let Some(first_name) = &payload.first_name {
        validate_name("first_name", first_name)?;
    }
    if let Some(last_name) = &payload.last_name {
        validate_name("last_name", last_name)?;
    }

    let email = payload.email.as_deref().map(normalize_email);
    if let Some(email) = &email {
        validate_email(email)?;
    }

    let password_hash = match payload.password.as_deref() {
        Some(password) => {
            check_password_policy(password)?;
            Some(hash_password(password)?)
        }
        None => None,
    };

    Ok(UpdateUserInput {
        first_name: payload.first_name.map(|s| s.trim().to_string()),
        last_name: payload.last_name.map(|s| s.trim().to_string()),
        email,
        class_cycle: payload.class_cycle,
        password_hash,
    })
}

/// GET /users - List all users.
async fn list_users(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());
    let users = user_repo.list().await?;

    Ok(Json(users.iter().map(user_info).collect::<Vec<_>>()))
}

/// GET /users/me - The caller's own profile.
async fn get_me(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_id(auth.user_id())
        .await?
        .ok_or_else(|| ApiError::not_found("user_not_found", "User not found"))?;

    Ok(Json(user_info(&user)))
}

/// GET /users/{id} - One user.
async fn get_user(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user_not_found", "User not found"))?;

    Ok(Json(user_info(&user)))
}

/// PUT /users/{id} - Update the caller's own profile.
async fn update_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<UserId>,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if auth.user_id() != id {
        return Err(ApiError::forbidden("Users may only update their own profile"));
    }

    let input = profile_update(payload)?;
    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo.update_profile(id, input).await?;

    info!(user_id = %id, "Profile updated");

    Ok(Json(user_info(&user)))
}

/// PUT /users/{id}/role - Assign a role. Admin only.
async fn assign_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<UserId>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let role: UserRole = payload
        .role
        .parse()
        .map_err(|e: UnknownRole| ApiError::bad_request("invalid_role", e.to_string()))?;

    let user_repo = UserRepository::new((*state.db).clone());
    let user = user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("user_not_found", "User not found"))?;

    if role.requires_class_cycle() && user.class_cycle.is_none() {
        return Err(ApiError::bad_request(
            "class_cycle_required",
            "The user has no class cycle and cannot become a student",
        ));
    }

    let user = user_repo.set_role(id, role).await?;

    info!(user_id = %id, role = %role, assigned_by = %auth.user_id(), "Role assigned");

    Ok(Json(user_info(&user)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_update_normalizes_email() {
        let input = profile_update(UpdateProfileRequest {
            email: Some(" New@Campus.Test ".to_string()),
            first_name: Some(" Grace ".to_string()),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(input.email.as_deref(), Some("new@campus.test"));
        assert_eq!(input.first_name.as_deref(), Some("Grace"));
        assert!(input.password_hash.is_none());
    }

    #[test]
    fn test_profile_update_hashes_password() {
        let input = profile_update(UpdateProfileRequest {
            password: Some("a much longer password".to_string()),
            ..Default::default()
        })
        .unwrap();

        let hash = input.password_hash.unwrap();
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_profile_update_rejects_blank_name() {
        let err = profile_update(UpdateProfileRequest {
            last_name: Some("   ".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "validation_error");
    }

    #[test]
    fn test_profile_update_rejects_weak_password() {
        let err = profile_update(UpdateProfileRequest {
            password: Some("short".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        assert_eq!(err.code(), "weak_password");
    }
}
