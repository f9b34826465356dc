//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, error::ApiError, middleware::auth_middleware};

pub mod attachments;
pub mod auth;
pub mod events;
pub mod forum;
pub mod health;
pub mod lessons;
pub mod questions;
pub mod users;

/// Creates the API router with protected routes that need state for middleware.
///
/// Public and protected routers may register different methods on the same
/// path; merging combines them, and only the protected methods pass through
/// [`auth_middleware`].
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    // Protected routes that require authentication
    let protected_routes = Router::new()
        .merge(users::routes())
        .merge(forum::protected_routes())
        .merge(attachments::protected_routes())
        .merge(events::protected_routes())
        .merge(lessons::protected_routes())
        .merge(questions::protected_routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    // Combine public and protected routes
    Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(forum::public_routes())
        .merge(attachments::public_routes())
        .merge(events::public_routes())
        .merge(lessons::public_routes())
        .merge(questions::public_routes())
        .merge(protected_routes)
}

/// Trims a required text field, rejecting it when blank.
pub(crate) fn required_text(field: &str, value: &str) -> Result<String, ApiError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation(format!("{field} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// Like [`required_text`] for fields that may be left out.
pub(crate) fn optional_text(field: &str, value: Option<&str>) -> Result<Option<String>, ApiError> {
    value.map(|v| required_text(field, v)).transpose()
}
