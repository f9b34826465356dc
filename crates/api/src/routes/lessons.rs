//! Lesson routes: categories, lessons and their files.
//!
//! Each lesson carries one current file, a document or a recording. Anyone may
//! browse and download. Every write is reserved for admins.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use campus_core::attachment::{
    Attachment, AttachmentParent, AttachmentRepository as AttachmentRepoTrait, ParentKind,
};
use campus_db::entities::{lesson_categories, lessons};
use campus_db::repositories::{CreateLessonInput, UpdateLessonInput};
use campus_db::{AttachmentRepository, LessonRepository};
use campus_shared::types::{CategoryId, LessonId};

use super::attachments::{self, AttachmentResponse};
use super::{optional_text, required_text};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Longest category name, in characters.
const MAX_CATEGORY_NAME_LENGTH: usize = 50;

/// Routes anyone may call.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/lessons/categories", get(list_categories))
        .route("/lessons/categories/{id}/lessons", get(list_category_lessons))
        .route("/lessons/{id}", get(get_lesson))
        .route("/lessons/{id}/content", get(download_lesson))
}

/// Routes that require an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/lessons/categories", post(create_category))
        .route("/lessons/categories/{id}", delete(delete_category))
        .route("/lessons", post(create_lesson))
        .route("/lessons/{id}", put(update_lesson).delete(delete_lesson))
        .route("/lessons/{id}/file", put(replace_lesson_file))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a category.
#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    /// Name, unique, at most 50 characters.
    pub name: String,
}

/// Request body for updating lesson details. The file is replaced separately.
#[derive(Debug, Deserialize)]
pub struct UpdateLessonRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
    /// New category.
    #[serde(default)]
    pub category_id: Option<CategoryId>,
}

/// A lesson category.
#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    /// Category ID.
    pub id: i64,
    /// Name.
    pub name: String,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<lesson_categories::Model> for CategoryResponse {
    fn from(category: lesson_categories::Model) -> Self {
        Self {
            id: category.id,
            name: category.name,
            created_at: category.created_at.to_rfc3339(),
        }
    }
}

/// A category with its lessons.
#[derive(Debug, Serialize)]
pub struct CategoryWithLessonsResponse {
    /// The category.
    #[serde(flatten)]
    pub category: CategoryResponse,
    /// Lessons, oldest first.
    pub lessons: Vec<LessonResponse>,
}

/// A lesson and its current file.
#[derive(Debug, Serialize)]
pub struct LessonResponse {
    /// Lesson ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Whether the file is a recording.
    pub is_audio: bool,
    /// Category ID.
    pub category_id: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
    /// Current file, if one is stored.
    pub file: Option<AttachmentResponse>,
}

impl LessonResponse {
    fn new(lesson: lessons::Model, file: Option<&Attachment>) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title,
            description: lesson.description,
            is_audio: lesson.is_audio,
            category_id: lesson.category_id,
            created_at: lesson.created_at.to_rfc3339(),
            file: file.map(AttachmentResponse::from),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn is_audio(content_type: &str) -> bool {
    content_type.starts_with("audio/")
}

fn check_category_name(name: &str) -> Result<(), ApiError> {
    if name.chars().count() > MAX_CATEGORY_NAME_LENGTH {
        return Err(ApiError::validation(format!(
            "name must be at most {MAX_CATEGORY_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn parse_category_id(value: Option<&str>) -> Result<CategoryId, ApiError> {
    let value = value.ok_or_else(|| ApiError::validation("category_id is required"))?;
    value
        .parse::<i64>()
        .map(CategoryId::new)
        .map_err(|_| ApiError::validation("category_id must be an integer"))
}

async fn load_lesson(repo: &LessonRepository, id: LessonId) -> Result<lessons::Model, ApiError> {
    repo.find(id)
        .await?
        .ok_or_else(|| ApiError::not_found("lesson_not_found", format!("Lesson not found: {id}")))
}

/// The current file of each lesson, keyed by lesson ID. Newest wins.
async fn current_files(
    state: &AppState,
    lessons: &[lessons::Model],
) -> Result<HashMap<i64, Attachment>, ApiError> {
    let parents: Vec<AttachmentParent> = lessons
        .iter()
        .map(|l| AttachmentParent::Lesson(LessonId::new(l.id)))
        .collect();

    let mut files = HashMap::new();
    for attachment in AttachmentRepository::new((*state.db).clone())
        .list_by_parents(&parents)
        .await?
    {
        if let Some(id) = attachment.parent.lesson_id() {
            files.entry(id.into_inner()).or_insert(attachment);
        }
    }
    Ok(files)
}

async fn with_files(
    state: &AppState,
    lessons: Vec<lessons::Model>,
) -> Result<Vec<LessonResponse>, ApiError> {
    let files = current_files(state, &lessons).await?;
    Ok(lessons
        .into_iter()
        .map(|lesson| {
            let file = files.get(&lesson.id);
            LessonResponse::new(lesson, file)
        })
        .collect())
}

async fn current_file(state: &AppState, id: LessonId) -> Result<Option<Attachment>, ApiError> {
    let files = AttachmentRepository::new((*state.db).clone())
        .list_by_parent(AttachmentParent::Lesson(id))
        .await?;
    Ok(files.into_iter().next())
}

// ============================================================================
// Category Handlers
// ============================================================================

/// GET `/lessons/categories`
/// Every category with its lessons.
async fn list_categories(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let grouped = LessonRepository::new((*state.db).clone())
        .list_categories_with_lessons()
        .await?;

    let all: Vec<lessons::Model> = grouped
        .iter()
        .flat_map(|(_, lessons)| lessons.iter().cloned())
        .collect();
    let files = current_files(&state, &all).await?;

    let response: Vec<CategoryWithLessonsResponse> = grouped
        .into_iter()
        .map(|(category, lessons)| CategoryWithLessonsResponse {
            category: category.into(),
            lessons: lessons
                .into_iter()
                .map(|lesson| {
                    let file = files.get(&lesson.id);
                    LessonResponse::new(lesson, file)
                })
                .collect(),
        })
        .collect();

    Ok(Json(response))
}

/// GET `/lessons/categories/{id}/lessons`
async fn list_category_lessons(
    State(state): State<AppState>,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse, ApiError> {
    let lessons = LessonRepository::new((*state.db).clone())
        .list_by_category(id)
        .await?;

    Ok(Json(with_files(&state, lessons).await?))
}

/// POST `/lessons/categories`
/// Admin only.
async fn create_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateCategoryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let name = required_text("name", &payload.name)?;
    check_category_name(&name)?;

    let category = LessonRepository::new((*state.db).clone())
        .create_category(name)
        .await?;

    info!(category_id = %category.id, created_by = %auth.user_id(), "Lesson category created");

    Ok((StatusCode::CREATED, Json(CategoryResponse::from(category))))
}

/// DELETE `/lessons/categories/{id}`
/// Admin only. The category must be empty.
async fn delete_category(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<CategoryId>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    LessonRepository::new((*state.db).clone())
        .delete_category(id)
        .await?;

    info!(category_id = %id, deleted_by = %auth.user_id(), "Lesson category deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Lesson Handlers
// ============================================================================

/// GET `/lessons/{id}`
async fn get_lesson(
    State(state): State<AppState>,
    Path(id): Path<LessonId>,
) -> Result<impl IntoResponse, ApiError> {
    let lesson = load_lesson(&LessonRepository::new((*state.db).clone()), id).await?;
    let file = current_file(&state, id).await?;

    Ok(Json(LessonResponse::new(lesson, file.as_ref())))
}

/// GET `/lessons/{id}/content`
/// The current file of the lesson.
async fn download_lesson(
    State(state): State<AppState>,
    Path(id): Path<LessonId>,
) -> Result<impl IntoResponse, ApiError> {
    let service = state.attachment_service()?;
    load_lesson(&LessonRepository::new((*state.db).clone()), id).await?;

    let file = current_file(&state, id).await?.ok_or_else(|| {
        ApiError::not_found("lesson_file_not_found", format!("Lesson {id} has no file"))
    })?;
    let (attachment, content) = service.fetch(file.id).await?;

    Ok(attachments::file_response(&attachment, content))
}

/// POST `/lessons`
/// Admin only. Multipart with `title`, `category_id`, an optional
/// `description` and the `file`.
///
/// The lesson row is created first so the file has a parent. If the file
/// cannot be stored the row is deleted again.
async fn create_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let service = state.attachment_service()?;

    let mut form = attachments::read_upload_form(multipart).await?;
    let title = required_text("title", form.text("title").unwrap_or_default())?;
    let description = form.text("description").map(str::to_string);
    let category_id = parse_category_id(form.text("category_id"))?;
    let file = form.require_file()?;
    file.check(service.policy(), ParentKind::Lesson)?;

    let repo = LessonRepository::new((*state.db).clone());
    let lesson = repo
        .create(CreateLessonInput {
            title,
            description,
            is_audio: is_audio(&file.content_type),
            category_id,
        })
        .await?;
    let lesson_id = LessonId::new(lesson.id);

    let attachment = match service
        .upload(file.into_request(AttachmentParent::Lesson(lesson_id)))
        .await
    {
        Ok(attachment) => attachment,
        Err(e) => {
            if let Err(cleanup) = repo.delete(lesson_id).await {
                warn!(
                    lesson_id = %lesson_id,
                    error = %cleanup,
                    "Failed to remove lesson without file"
                );
            }
            return Err(e.into());
        }
    };

    info!(
        lesson_id = %lesson_id,
        attachment_id = %attachment.id,
        created_by = %auth.user_id(),
        "Lesson created"
    );

    Ok((
        StatusCode::CREATED,
        Json(LessonResponse::new(lesson, Some(&attachment))),
    ))
}

/// PUT `/lessons/{id}`
/// Admin only. Details only; see `/lessons/{id}/file` for the file.
async fn update_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LessonId>,
    Json(payload): Json<UpdateLessonRequest>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let input = UpdateLessonInput {
        title: optional_text("title", payload.title.as_deref())?,
        description: payload.description,
        category_id: payload.category_id,
        is_audio: None,
    };

    let lesson = LessonRepository::new((*state.db).clone())
        .update(id, input)
        .await?;
    let file = current_file(&state, id).await?;

    Ok(Json(LessonResponse::new(lesson, file.as_ref())))
}

/// PUT `/lessons/{id}/file`
/// Admin only. Stores a new file and removes the previous one.
async fn replace_lesson_file(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LessonId>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;
    let service = state.attachment_service()?;

    let file = attachments::read_file_part(multipart).await?;
    file.check(service.policy(), ParentKind::Lesson)?;
    let audio = is_audio(&file.content_type);

    let repo = LessonRepository::new((*state.db).clone());
    load_lesson(&repo, id).await?;

    let attachment = service
        .replace(file.into_request(AttachmentParent::Lesson(id)))
        .await?;
    let lesson = repo
        .update(
            id,
            UpdateLessonInput {
                is_audio: Some(audio),
                ..Default::default()
            },
        )
        .await?;

    info!(lesson_id = %id, attachment_id = %attachment.id, "Lesson file replaced");

    Ok(Json(LessonResponse::new(lesson, Some(&attachment))))
}

/// DELETE `/lessons/{id}`
/// Admin only. The file is removed first.
async fn delete_lesson(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<LessonId>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let repo = LessonRepository::new((*state.db).clone());
    load_lesson(&repo, id).await?;

    attachments::purge_attachments(&state, &[AttachmentParent::Lesson(id)]).await?;

    if !repo.delete(id).await? {
        return Err(ApiError::not_found(
            "lesson_not_found",
            format!("Lesson not found: {id}"),
        ));
    }

    info!(lesson_id = %id, deleted_by = %auth.user_id(), "Lesson deleted");

    Ok(StatusCode::NO_CONTENT)
}
