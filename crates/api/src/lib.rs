//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for auth, users, the forum, attachments, events, lessons
//!   and the Q&A board
//! - Authentication middleware
//! - JSON error responses

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use campus_core::attachment::{AttachmentPolicy, AttachmentService};
use campus_core::storage::StorageService;
use campus_db::AttachmentRepository;
use campus_shared::JwtService;
use campus_shared::config::AuthConfig;

pub use error::ApiError;

/// Extra room above the largest allowed file for multipart framing and other fields.
const MULTIPART_OVERHEAD_BYTES: u64 = 1024 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for token operations.
    pub jwt_service: Arc<JwtService>,
    /// Storage service for file attachments (optional).
    pub storage: Option<Arc<StorageService>>,
    /// Upload policy for attachments.
    pub policy: AttachmentPolicy,
    /// Registration settings.
    pub auth: Arc<AuthConfig>,
}

impl AppState {
    /// Builds the attachment service over the configured storage.
    ///
    /// # Errors
    ///
    /// Returns `storage_not_configured` when no storage is configured.
    pub fn attachment_service(&self) -> Result<AttachmentService<AttachmentRepository>, ApiError> {
        let storage = self
            .storage
            .clone()
            .ok_or_else(ApiError::storage_not_configured)?;

        Ok(AttachmentService::new(
            self.policy.clone(),
            storage,
            Arc::new(AttachmentRepository::new((*self.db).clone())),
        ))
    }

    /// Request body limit: the largest allowed file plus multipart overhead.
    #[must_use]
    pub fn body_limit(&self) -> usize {
        let bytes = self
            .policy
            .max_file_size_bytes()
            .saturating_add(MULTIPART_OVERHEAD_BYTES);
        usize::try_from(bytes).unwrap_or(usize::MAX)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
