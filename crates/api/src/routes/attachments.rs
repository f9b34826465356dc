//! Attachment routes for forum posts and replies, plus the multipart and
//! download helpers the event and lesson routes share.
//!
//! Uploads arrive as multipart form data with a `file` part and are stored
//! through the attachment service. Metadata reads go straight to the
//! database, so they keep working when no storage is configured.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{
        Multipart, Path, State,
        multipart::{Field, MultipartError},
    },
    http::{HeaderName, HeaderValue, StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use bytes::Bytes;
use serde::Serialize;
use tracing::info;

use campus_core::attachment::{
    Attachment, AttachmentError, AttachmentParent, AttachmentPolicy,
    AttachmentRepository as AttachmentRepoTrait, ParentKind, UploadRequest,
};
use campus_db::{AttachmentRepository, ForumRepository};
use campus_shared::types::{AttachmentId, EventId, LessonId, PostId, ReplyId, UserId};

use crate::{AppState, error::ApiError, middleware::AuthUser};

const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Routes anyone may call.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/posts/{id}/attachments", get(list_post_attachments))
        .route("/forum/replies/{id}/attachments", get(list_reply_attachments))
        .route("/forum/attachments/{id}", get(get_attachment))
        .route("/forum/attachments/{id}/content", get(download_attachment))
}

/// Routes that require an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/posts/{id}/attachments", post(upload_post_attachment))
        .route("/forum/replies/{id}/attachments", post(upload_reply_attachment))
        .route("/forum/attachments/{id}", delete(delete_attachment))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Attachment metadata. Exactly one parent field is present.
#[derive(Debug, Serialize)]
pub struct AttachmentResponse {
    /// Attachment ID.
    pub id: i64,
    /// Post the file is attached to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub post_id: Option<i64>,
    /// Reply the file is attached to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_id: Option<i64>,
    /// Event the image belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
    /// Lesson the file belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lesson_id: Option<i64>,
    /// Original filename.
    pub filename: String,
    /// MIME type.
    pub content_type: String,
    /// File size in bytes.
    pub byte_size: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<&Attachment> for AttachmentResponse {
    fn from(attachment: &Attachment) -> Self {
        Self {
            id: attachment.id.into_inner(),
            post_id: attachment.parent.post_id().map(PostId::into_inner),
            reply_id: attachment.parent.reply_id().map(ReplyId::into_inner),
            event_id: attachment.parent.event_id().map(EventId::into_inner),
            lesson_id: attachment.parent.lesson_id().map(LessonId::into_inner),
            filename: attachment.filename.clone(),
            content_type: attachment.content_type.clone(),
            byte_size: attachment.byte_size,
            created_at: attachment.created_at.to_rfc3339(),
        }
    }
}

/// A file extracted from a multipart body.
#[derive(Debug)]
pub(crate) struct UploadedFile {
    pub(crate) filename: String,
    pub(crate) content_type: String,
    pub(crate) content: Bytes,
}

impl UploadedFile {
    /// Applies the upload policy for `kind` before any I/O.
    pub(crate) fn check(&self, policy: &AttachmentPolicy, kind: ParentKind) -> Result<(), ApiError> {
        policy.validate_for(kind, &self.filename, &self.content_type, self.content.len())?;
        Ok(())
    }

    pub(crate) fn into_request(self, parent: AttachmentParent) -> UploadRequest {
        UploadRequest {
            parent,
            filename: self.filename,
            content_type: self.content_type,
            content: self.content,
        }
    }
}

/// Text fields and the optional `file` part of a multipart body.
#[derive(Debug, Default)]
pub(crate) struct UploadForm {
    pub(crate) fields: HashMap<String, String>,
    pub(crate) file: Option<UploadedFile>,
}

impl UploadForm {
    /// A text field, trimmed. Blank values count as absent.
    pub(crate) fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// The `file` part, which must be present.
    pub(crate) fn require_file(&mut self) -> Result<UploadedFile, ApiError> {
        self.file.take().ok_or_else(|| {
            ApiError::bad_request("missing_file", "Multipart field 'file' is required")
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn multipart_error(e: &MultipartError) -> ApiError {
    ApiError::new(e.status(), "invalid_multipart", e.body_text())
}

async fn read_file_field(field: Field<'_>) -> Result<UploadedFile, ApiError> {
    let filename = field
        .file_name()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError::bad_request("missing_filename", "The file part must carry a filename")
        })?;

    let content_type = field
        .content_type()
        .unwrap_or(DEFAULT_CONTENT_TYPE)
        .to_string();

    let content = field.bytes().await.map_err(|e| multipart_error(&e))?;

    Ok(UploadedFile {
        filename,
        content_type,
        content,
    })
}

/// Reads every part of a multipart body. The first `file` part wins; other
/// named parts are kept as text.
pub(crate) async fn read_upload_form(mut multipart: Multipart) -> Result<UploadForm, ApiError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(&e))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "file" {
            if form.file.is_none() {
                form.file = Some(read_file_field(field).await?);
            }
        } else {
            let value = field.text().await.map_err(|e| multipart_error(&e))?;
            form.fields.insert(name, value);
        }
    }

    Ok(form)
}

/// Reads the `file` part of a multipart body. Other parts are ignored.
pub(crate) async fn read_file_part(multipart: Multipart) -> Result<UploadedFile, ApiError> {
    read_upload_form(multipart).await?.require_file()
}

/// Makes a filename safe to place inside a quoted `Content-Disposition` value.
fn disposition_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

fn content_disposition(filename: &str) -> HeaderValue {
    HeaderValue::from_str(&format!(
        "attachment; filename=\"{}\"",
        disposition_filename(filename)
    ))
    .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}

/// Who may attach files to `parent`: the author of a post or reply, and only
/// admins for events and lessons.
async fn authorize_upload(
    state: &AppState,
    auth: &AuthUser,
    parent: AttachmentParent,
) -> Result<(), ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let author_id = match parent {
        AttachmentParent::Post(id) => repo.find_post(id).await?.map(|p| p.author_id),
        AttachmentParent::Reply(id) => repo.find_reply(id).await?.map(|r| r.author_id),
        AttachmentParent::Event(_) | AttachmentParent::Lesson(_) => return auth.require_admin(),
    };

    let owner = author_id
        .map(UserId::new)
        .ok_or(AttachmentError::ParentNotFound(parent))?;
    auth.require_owner_or_admin(owner)
}

/// Shared body of the upload routes.
pub(crate) async fn upload(
    state: &AppState,
    auth: &AuthUser,
    parent: AttachmentParent,
    multipart: Multipart,
) -> Result<(StatusCode, Json<AttachmentResponse>), ApiError> {
    let service = state.attachment_service()?;

    let file = read_file_part(multipart).await?;
    file.check(service.policy(), parent.kind())?;

    authorize_upload(state, auth, parent).await?;

    let attachment = service.upload(file.into_request(parent)).await?;

    info!(
        attachment_id = %attachment.id,
        parent = %parent,
        uploaded_by = %auth.user_id(),
        "Attachment created"
    );

    Ok((StatusCode::CREATED, Json(AttachmentResponse::from(&attachment))))
}

pub(crate) async fn list_for(
    state: &AppState,
    parent: AttachmentParent,
) -> Result<Json<Vec<AttachmentResponse>>, ApiError> {
    let repo = AttachmentRepository::new((*state.db).clone());
    if !repo.parent_exists(parent).await? {
        return Err(AttachmentError::ParentNotFound(parent).into());
    }

    let attachments = repo.list_by_parent(parent).await?;
    Ok(Json(
        attachments
            .iter()
            .map(AttachmentResponse::from)
            .collect(),
    ))
}

/// Metadata of an attachment whose parent is of `kind`. Anything else is
/// reported as missing.
pub(crate) async fn find_of_kind(
    state: &AppState,
    id: AttachmentId,
    kind: Option<ParentKind>,
) -> Result<Attachment, ApiError> {
    let attachment = AttachmentRepository::new((*state.db).clone())
        .find_by_id(id)
        .await?
        .filter(|a| kind.is_none_or(|k| a.parent.kind() == k))
        .ok_or(AttachmentError::NotFound(id))?;
    Ok(attachment)
}

/// Stored bytes with their type and original filename.
pub(crate) type FileResponse = ([(HeaderName, HeaderValue); 2], Bytes);

pub(crate) fn file_response(attachment: &Attachment, content: Bytes) -> FileResponse {
    let content_type = HeaderValue::from_str(&attachment.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    (
        [
            (header::CONTENT_TYPE, content_type),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(&attachment.filename),
            ),
        ],
        content,
    )
}

/// Streams an attachment whose parent is of `kind`.
pub(crate) async fn download(
    state: &AppState,
    id: AttachmentId,
    kind: Option<ParentKind>,
) -> Result<FileResponse, ApiError> {
    let service = state.attachment_service()?;
    find_of_kind(state, id, kind).await?;
    let (attachment, content) = service.fetch(id).await?;

    Ok(file_response(&attachment, content))
}

/// Removes every attachment of `parents`, blobs first.
///
/// Without storage the metadata cannot be removed safely, so the call fails
/// if any attachment exists and succeeds otherwise.
pub(crate) async fn purge_attachments(
    state: &AppState,
    parents: &[AttachmentParent],
) -> Result<(), ApiError> {
    if state.storage.is_none() {
        let repo = AttachmentRepository::new((*state.db).clone());
        for parent in parents {
            if !repo.list_by_parent(*parent).await?.is_empty() {
                return Err(ApiError::storage_not_configured());
            }
        }
        return Ok(());
    }

    let service = state.attachment_service()?;
    for parent in parents {
        let removed = service.purge_parent(*parent).await?;
        if removed > 0 {
            info!(parent = %parent, removed, "Purged attachments");
        }
    }
    Ok(())
}

// ============================================================================
// Route Handlers
// ============================================================================

/// POST `/forum/posts/{id}/attachments`
/// Upload a file to a post. Author of the post or admin.
async fn upload_post_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PostId>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    upload(&state, &auth, AttachmentParent::Post(id), multipart).await
}

/// POST `/forum/replies/{id}/attachments`
/// Upload a file to a reply. Author of the reply or admin.
async fn upload_reply_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ReplyId>,
    multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    upload(&state, &auth, AttachmentParent::Reply(id), multipart).await
}

/// GET `/forum/posts/{id}/attachments`
async fn list_post_attachments(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    list_for(&state, AttachmentParent::Post(id)).await
}

/// GET `/forum/replies/{id}/attachments`
async fn list_reply_attachments(
    State(state): State<AppState>,
    Path(id): Path<ReplyId>,
) -> Result<impl IntoResponse, ApiError> {
    list_for(&state, AttachmentParent::Reply(id)).await
}

/// GET `/forum/attachments/{id}`
/// Metadata only, for any kind of parent.
async fn get_attachment(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    let attachment = find_of_kind(&state, id, None).await?;
    Ok(Json(AttachmentResponse::from(&attachment)))
}

/// GET `/forum/attachments/{id}/content`
/// The stored bytes.
async fn download_attachment(
    State(state): State<AppState>,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    download(&state, id, None).await
}

/// DELETE `/forum/attachments/{id}`
/// Admin only.
async fn delete_attachment(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<AttachmentId>,
) -> Result<impl IntoResponse, ApiError> {
    auth.require_admin()?;

    let service = state.attachment_service()?;
    service.delete(id).await?;

    info!(attachment_id = %id, deleted_by = %auth.user_id(), "Attachment deleted");

    Ok(StatusCode::NO_CONTENT)
}
