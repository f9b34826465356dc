//! Event routes: the public calendar and its images.
//!
//! Anyone may browse events and download their images. Creating, editing and
//! deleting events or images is reserved for admins.

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use campus_core::attachment::{
    AttachmentParent, AttachmentRepository as AttachmentRepoTrait, ParentKind,
};
use campus_db::entities::events;
use campus_db::repositories::{CreateEventInput, UpdateEventInput};
use campus_db::{AttachmentRepository, EventRepository};
use campus_shared::types::{AttachmentId, EventId};

use super::attachments::{self, AttachmentResponse};
use super::{optional_text, required_text};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Longest event title, in characters.
const MAX_TITLE_LENGTH: usize = 100;

/// Routes anyone may call.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/events", get(list_events))
        .route("/events/{id}", get(get_event))
        .route("/events/{id}/images", get(list_images))
        .route("/events/images/{id}/content", get(download_image))
}

/// Routes that require an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/events", post(create_event))
        .route("/events/{id}", put(update_event).delete(delete_event))
        .route("/events/{id}/images", post(upload_image))
        .route("/events/images/{id}", delete(delete_image))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating an event.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    /// Title, at most 100 characters.
    pub title: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for updating an event.
#[derive(Debug, Deserialize)]
pub struct UpdateEventRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A calendar event.
#[derive(Debug, Serialize)]
pub struct EventResponse {
    /// Event ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<events::Model> for EventResponse {
    fn from(event: events::Model) -> Self {
        Self {
            id: event.id,
            title: event.title,
            description: event.description,
            created_at: event.created_at.to_rfc3339(),
        }
    }
}

/// An event together with its images.
#[derive(Debug, Serialize)]
pub struct EventDetailResponse {
    /// The event.
    #[serde(flatten)]
    pub event: EventResponse,
    /// Image metadata, newest first.
    pub images: Vec<AttachmentResponse>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn check_title(title: &str) -> Result<(), ApiError> {
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(ApiError::validation(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

async fn load_event(repo: &EventRepository, id: EventId) -> Result<events::Model, ApiError> {
    repo.find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("event_not_found", format!("Event not found: {id}")))
}

// ============================================================================
// Event Handlers
// ============================================================================

/// GET `/events`
async fn list_events(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let events = EventRepository::new((*state.db).clone()).list().await?;

    Ok(Json(
        events
            .into_iter()
            .map(EventResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET `/events/{id}`
/// The event with its image metadata.
async fn get_event(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    let event = load_event(&EventRepository::new((*state.db).clone()), id).await?;

    let images = AttachmentRepository::new((*state.db).clone())
        .list_by_parent(AttachmentParent::Event(id))
        .await?;

    Ok(Json(EventDetailResponse {
        event: event.into(),
        images: images.iter().map(AttachmentResponse::from).collect(),
    }))
}

/// POST `/events`
/// Admin only.
async fn create_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let title = required_text("title", &payload.title)?;
    check_title(&title)?;

    let event = EventRepository::new((*state.db).clone())
        .create(CreateEventInput {
            title,
            description: payload.description,
        })
        .await?;

    info!(event_id = %event.id, created_by = %auth.user_id(), "Event created");

    Ok((StatusCode::CREATED, Json(EventResponse::from(event))))
}

/// PUT `/events/{id}`
/// Admin only.
async fn update_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<EventId>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let title = optional_text("title", payload.title.as_deref())?;
    if let Some(title) = &title {
        check_title(title)?;
    }

    let event = EventRepository::new((*state.db).clone())
        .update(
            id,
            UpdateEventInput {
                title,
                description: payload.description,
            },
        )
        .await?;

    Ok(Json(EventResponse::from(event)))
}

/// DELETE `/events/{id}`
/// Admin only. Images are removed first.
async fn delete_event(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let repo = EventRepository::new((*state.db).clone());
    load_event(&repo, id).await?;

    attachments::purge_attachments(&state, &[AttachmentParent::Event(id)]).await?;

    if !repo.delete(id).await? {
        return Err(ApiError::not_found(
            "event_not_found",
            format!("Event not found: {id}"),
        ));
    }

    info!(event_id = %id, deleted_by = %auth.user_id(), "Event deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Image Handlers
// ============================================================================

/// GET `/events/{id}/images`
async fn list_images(
    State(state): State<AppState>,
    Path(id): Path<EventId>,
) -> Result<impl IntoResponse, ApiError> {
    attachments::list_for(&state, AttachmentParent::Event(id)).await
}

/// GET `/events/images/{id}/content`
async fn download_image(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    attachments::download(&state, id, Some(ParentKind::Event)).await
}

/// POST `/events/{id}/images`
/// Admin only. Images only.
async fn upload_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<EventId>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    attachments::upload(&state, &auth, AttachmentParent::Event(id), multipart).await
}

/// DELETE `/events/images/{id}`
/// Admin only.
async fn delete_image(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let service = state.attachment_service()?;
    attachments::find_of_kind(&state, id, Some(ParentKind::Event)).await?;
    service.delete(id).await?;

    info!(attachment_id = %id, deleted_by = %auth.user_id(), "Event image deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_title_length_limit() {
        assert!(check_title(&"a".repeat(MAX_TITLE_LENGTH)).is_ok());
        assert_eq!(
            check_title(&"a".repeat(MAX_TITLE_LENGTH + 1))
                .unwrap_err()
                .code(),
            "validation_error"
        );
    }

    #[test]
    fn test_update_request_fields_are_optional() {
        let request: UpdateEventRequest = serde_json::from_str("{}").unwrap();
        assert!(request.title.is_none());
        assert!(request.description.is_none());
    }
}
