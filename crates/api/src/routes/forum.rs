//! Forum routes for clusters, posts and replies.
//!
//! Reads are public. Writes require authentication, and changing or removing
//! something requires being its author or an admin.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use campus_core::attachment::{AttachmentParent, AttachmentRepository as AttachmentRepoTrait};
use campus_db::entities::{forum_clusters, forum_posts, forum_replies};
use campus_db::repositories::{
    CreateClusterInput, CreatePostInput, UpdateClusterInput, UpdatePostInput,
};
use campus_db::{AttachmentRepository, ForumRepository};
use campus_shared::types::{ClusterId, PostId, ReplyId, UserId};

use super::attachments::{AttachmentResponse, purge_attachments};
use super::{optional_text, required_text};
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Routes anyone may call.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/posts", get(list_posts))
        .route("/forum/posts/{id}", get(get_post))
        .route("/forum/posts/{id}/replies", get(list_replies))
        .route("/forum/clusters", get(list_clusters))
}

/// Routes that require an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/forum/posts", post(create_post))
        .route("/forum/posts/{id}", put(update_post).delete(delete_post))
        .route("/forum/posts/{id}/replies", post(create_reply))
        .route("/forum/replies/{id}", put(update_reply).delete(delete_reply))
        .route("/forum/clusters", post(create_cluster))
        .route(
            "/forum/clusters/{id}",
            put(update_cluster).delete(delete_cluster),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for creating a post.
#[derive(Debug, Deserialize)]
pub struct CreatePostRequest {
    /// Title, unique across the forum.
    pub title: String,
    /// Body.
    pub content: String,
    /// Optional cluster.
    #[serde(default)]
    pub cluster_id: Option<ClusterId>,
}

/// Request body for updating a post.
#[derive(Debug, Deserialize)]
pub struct UpdatePostRequest {
    /// New title.
    #[serde(default)]
    pub title: Option<String>,
    /// New body.
    #[serde(default)]
    pub content: Option<String>,
}

/// Request body for creating or editing a reply.
#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    /// Body.
    pub content: String,
}

/// Request body for creating a cluster.
#[derive(Debug, Deserialize)]
pub struct CreateClusterRequest {
    /// Name, unique across the forum.
    pub name: String,
    /// Description.
    #[serde(default)]
    pub description: Option<String>,
}

/// Request body for updating a cluster.
#[derive(Debug, Deserialize)]
pub struct UpdateClusterRequest {
    /// New name.
    #[serde(default)]
    pub name: Option<String>,
    /// New description.
    #[serde(default)]
    pub description: Option<String>,
}

/// A forum post.
#[derive(Debug, Serialize)]
pub struct PostResponse {
    /// Post ID.
    pub id: i64,
    /// Title.
    pub title: String,
    /// Body.
    pub content: String,
    /// Author user ID.
    pub author_id: i64,
    /// Cluster ID.
    pub cluster_id: Option<i64>,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<forum_posts::Model> for PostResponse {
    fn from(post: forum_posts::Model) -> Self {
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            author_id: post.author_id,
            cluster_id: post.cluster_id,
            created_at: post.created_at.to_rfc3339(),
        }
    }
}

/// A post together with its attachments.
#[derive(Debug, Serialize)]
pub struct PostDetailResponse {
    /// The post.
    #[serde(flatten)]
    pub post: PostResponse,
    /// Attachment metadata, newest first.
    pub attachments: Vec<AttachmentResponse>,
}

/// A reply to a post.
#[derive(Debug, Serialize)]
pub struct ReplyResponse {
    /// Reply ID.
    pub id: i64,
    /// Post this reply belongs to.
    pub post_id: i64,
    /// Body.
    pub content: String,
    /// Author user ID.
    pub author_id: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<forum_replies::Model> for ReplyResponse {
    fn from(reply: forum_replies::Model) -> Self {
        Self {
            id: reply.id,
            post_id: reply.post_id,
            content: reply.content,
            author_id: reply.author_id,
            created_at: reply.created_at.to_rfc3339(),
        }
    }
}

/// A cluster grouping posts.
#[derive(Debug, Serialize)]
pub struct ClusterResponse {
    /// Cluster ID.
    pub id: i64,
    /// Name.
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Creator user ID.
    pub author_id: i64,
    /// Created at timestamp (ISO 8601).
    pub created_at: String,
}

impl From<forum_clusters::Model> for ClusterResponse {
    fn from(cluster: forum_clusters::Model) -> Self {
        Self {
            id: cluster.id,
            name: cluster.name,
            description: cluster.description,
            author_id: cluster.author_id,
            created_at: cluster.created_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

fn require_author_role(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_author() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Your role may not write to the forum"))
    }
}

async fn load_post(repo: &ForumRepository, id: PostId) -> Result<forum_posts::Model, ApiError> {
    repo.find_post(id)
        .await?
        .ok_or_else(|| ApiError::not_found("post_not_found", format!("Post not found: {id}")))
}

async fn load_reply(repo: &ForumRepository, id: ReplyId) -> Result<forum_replies::Model, ApiError> {
    repo.find_reply(id)
        .await?
        .ok_or_else(|| ApiError::not_found("reply_not_found", format!("Reply not found: {id}")))
}

async fn load_cluster(
    repo: &ForumRepository,
    id: ClusterId,
) -> Result<forum_clusters::Model, ApiError> {
    repo.find_cluster(id).await?.ok_or_else(|| {
        ApiError::not_found("cluster_not_found", format!("Cluster not found: {id}"))
    })
}

// ============================================================================
// Post Handlers
// ============================================================================

/// GET `/forum/posts`
async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let posts = repo.list_posts().await?;

    Ok(Json(
        posts
            .into_iter()
            .map(PostResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET `/forum/posts/{id}`
/// The post with its attachment metadata.
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let post = load_post(&repo, id).await?;

    let attachments = AttachmentRepository::new((*state.db).clone())
        .list_by_parent(AttachmentParent::Post(id))
        .await?;

    Ok(Json(PostDetailResponse {
        post: post.into(),
        attachments: attachments.iter().map(AttachmentResponse::from).collect(),
    }))
}

/// POST `/forum/posts`
async fn create_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_author_role(&auth)?;
    let title = required_text("title", &payload.title)?;
    let content = required_text("content", &payload.content)?;

    let repo = ForumRepository::new((*state.db).clone());
    let post = repo
        .create_post(CreatePostInput {
            title,
            content,
            author_id: auth.user_id(),
            cluster_id: payload.cluster_id,
        })
        .await?;

    info!(post_id = %post.id, author_id = %auth.user_id(), "Post created");

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}

/// PUT `/forum/posts/{id}`
async fn update_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PostId>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdatePostInput {
        title: optional_text("title", payload.title.as_deref())?,
        content: optional_text("content", payload.content.as_deref())?,
    };

    let repo = ForumRepository::new((*state.db).clone());
    let post = load_post(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(post.author_id))?;

    let post = repo.update_post(id, input).await?;

    Ok(Json(PostResponse::from(post)))
}

/// DELETE `/forum/posts/{id}`
/// Attachments of the post and its replies are removed first; the replies
/// themselves cascade with the post.
async fn delete_post(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let post = load_post(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(post.author_id))?;

    let mut parents: Vec<AttachmentParent> = repo
        .reply_ids(id)
        .await?
        .into_iter()
        .map(AttachmentParent::Reply)
        .collect();
    parents.push(AttachmentParent::Post(id));

    purge_attachments(&state, &parents).await?;

    if !repo.delete_post(id).await? {
        return Err(ApiError::not_found(
            "post_not_found",
            format!("Post not found: {id}"),
        ));
    }

    info!(post_id = %id, deleted_by = %auth.user_id(), "Post deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Reply Handlers
// ============================================================================

/// GET `/forum/posts/{id}/replies`
async fn list_replies(
    State(state): State<AppState>,
    Path(id): Path<PostId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let replies = repo.list_replies(id).await?;

    Ok(Json(
        replies
            .into_iter()
            .map(ReplyResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST `/forum/posts/{id}/replies`
async fn create_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<PostId>,
    Json(payload): Json<ReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_author_role(&auth)?;
    let content = required_text("content", &payload.content)?;

    let repo = ForumRepository::new((*state.db).clone());
    let reply = repo.create_reply(id, auth.user_id(), content).await?;

    info!(reply_id = %reply.id, post_id = %id, "Reply created");

    Ok((StatusCode::CREATED, Json(ReplyResponse::from(reply))))
}

/// PUT `/forum/replies/{id}`
async fn update_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ReplyId>,
    Json(payload): Json<ReplyRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let content = required_text("content", &payload.content)?;

    let repo = ForumRepository::new((*state.db).clone());
    let reply = load_reply(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(reply.author_id))?;

    let reply = repo.update_reply(id, content).await?;

    Ok(Json(ReplyResponse::from(reply)))
}

/// DELETE `/forum/replies/{id}`
async fn delete_reply(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ReplyId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let reply = load_reply(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(reply.author_id))?;

    purge_attachments(&state, &[AttachmentParent::Reply(id)]).await?;

    if !repo.delete_reply(id).await? {
        return Err(ApiError::not_found(
            "reply_not_found",
            format!("Reply not found: {id}"),
        ));
    }

    info!(reply_id = %id, deleted_by = %auth.user_id(), "Reply deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Cluster Handlers
// ============================================================================

/// GET `/forum/clusters`
async fn list_clusters(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let clusters = repo.list_clusters().await?;

    Ok(Json(
        clusters
            .into_iter()
            .map(ClusterResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST `/forum/clusters`
async fn create_cluster(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<CreateClusterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_author_role(&auth)?;
    let name = required_text("name", &payload.name)?;

    let repo = ForumRepository::new((*state.db).clone());
    let cluster = repo
        .create_cluster(CreateClusterInput {
            name,
            description: payload.description,
            author_id: auth.user_id(),
        })
        .await?;

    info!(cluster_id = %cluster.id, "Cluster created");

    Ok((StatusCode::CREATED, Json(ClusterResponse::from(cluster))))
}

/// PUT `/forum/clusters/{id}`
async fn update_cluster(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ClusterId>,
    Json(payload): Json<UpdateClusterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = UpdateClusterInput {
        name: optional_text("name", payload.name.as_deref())?,
        description: payload.description,
    };

    let repo = ForumRepository::new((*state.db).clone());
    let cluster = load_cluster(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(cluster.author_id))?;

    let cluster = repo.update_cluster(id, input).await?;

    Ok(Json(ClusterResponse::from(cluster)))
}

/// DELETE `/forum/clusters/{id}`
/// Posts in the cluster are kept and unlinked.
async fn delete_cluster(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<ClusterId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = ForumRepository::new((*state.db).clone());
    let cluster = load_cluster(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(cluster.author_id))?;

    repo.delete_cluster(id).await?;

    info!(cluster_id = %id, deleted_by = %auth.user_id(), "Cluster deleted");

    Ok(StatusCode::NO_CONTENT)
}
