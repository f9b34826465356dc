//! Forum repository for clusters, posts and replies.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};

use campus_shared::types::{ClusterId, PostId, ReplyId, UserId};

use crate::entities::{forum_clusters, forum_posts, forum_replies};

/// Error types for forum operations.
#[derive(Debug, thiserror::Error)]
pub enum ForumError {
    /// Post title already taken.
    #[error("A post titled '{0}' already exists")]
    DuplicateTitle(String),

    /// Cluster name already taken.
    #[error("A cluster named '{0}' already exists")]
    DuplicateClusterName(String),

    /// Post not found.
    #[error("Post not found: {0}")]
    PostNotFound(PostId),

    /// Reply not found.
    #[error("Reply not found: {0}")]
    ReplyNotFound(ReplyId),

    /// Cluster not found.
    #[error("Cluster not found: {0}")]
    ClusterNotFound(ClusterId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a post.
#[derive(Debug, Clone)]
pub struct CreatePostInput {
    /// Post title (must be unique).
    pub title: String,
    /// Post body.
    pub content: String,
    /// Author.
    pub author_id: UserId,
    /// Optional cluster.
    pub cluster_id: Option<ClusterId>,
}

/// Input for updating a post.
#[derive(Debug, Clone, Default)]
pub struct UpdatePostInput {
    /// New title.
    pub title: Option<String>,
    /// New body.
    pub content: Option<String>,
}

/// Input for creating a cluster.
#[derive(Debug, Clone)]
pub struct CreateClusterInput {
    /// Cluster name (must be unique).
    pub name: String,
    /// Description.
    pub description: Option<String>,
    /// Creator.
    pub author_id: UserId,
}

/// Input for updating a cluster.
#[derive(Debug, Clone, Default)]
pub struct UpdateClusterInput {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Forum repository.
#[derive(Debug, Clone)]
pub struct ForumRepository {
    db: DatabaseConnection,
}

impl ForumRepository {
    /// Creates a new forum repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Posts
    // ========================================================================

    /// Lists posts, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_posts(&self) -> Result<Vec<forum_posts::Model>, ForumError> {
        let posts = forum_posts::Entity::find()
            .order_by_desc(forum_posts::Column::CreatedAt)
            .order_by_desc(forum_posts::Column::Id)
            .all(&self.db)
            .await?;
        Ok(posts)
    }

    /// Finds a post by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_post(&self, id: PostId) -> Result<Option<forum_posts::Model>, ForumError> {
        let post = forum_posts::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(post)
    }

    /// Creates a post.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The title is taken
    /// - The cluster does not exist
    pub async fn create_post(
        &self,
        input: CreatePostInput,
    ) -> Result<forum_posts::Model, ForumError> {
        if self.title_exists(&input.title, None).await? {
            return Err(ForumError::DuplicateTitle(input.title));
        }

        if let Some(cluster_id) = input.cluster_id
            && self.find_cluster(cluster_id).await?.is_none()
        {
            return Err(ForumError::ClusterNotFound(cluster_id));
        }

        let post = forum_posts::ActiveModel {
            title: Set(input.title),
            content: Set(input.content),
            author_id: Set(input.author_id.into_inner()),
            cluster_id: Set(input.cluster_id.map(ClusterId::into_inner)),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(post.insert(&self.db).await?)
    }

    /// Updates a post.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Post not found
    /// - New title already taken by another post
    pub async fn update_post(
        &self,
        id: PostId,
        input: UpdatePostInput,
    ) -> Result<forum_posts::Model, ForumError> {
        let post = self
            .find_post(id)
            .await?
            .ok_or(ForumError::PostNotFound(id))?;

        if let Some(title) = &input.title
            && *title != post.title
            && self.title_exists(title, Some(id)).await?
        {
            return Err(ForumError::DuplicateTitle(title.clone()));
        }

        let mut active: forum_posts::ActiveModel = post.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(content) = input.content {
            active.content = Set(content);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a post. Its replies go with it.
    ///
    /// Fails with a foreign key violation while attachments still reference
    /// the post or any of its replies.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_post(&self, id: PostId) -> Result<bool, ForumError> {
        let result = forum_posts::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Checks whether a post title is taken, optionally ignoring one post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn title_exists(
        &self,
        title: &str,
        exclude: Option<PostId>,
    ) -> Result<bool, ForumError> {
        let mut query = forum_posts::Entity::find().filter(forum_posts::Column::Title.eq(title));
        if let Some(id) = exclude {
            query = query.filter(forum_posts::Column::Id.ne(id.into_inner()));
        }
        Ok(query.count(&self.db).await? > 0)
    }

    // ========================================================================
    // Replies
    // ========================================================================

    /// Lists the replies to a post, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` if the post does not exist.
    pub async fn list_replies(
        &self,
        post_id: PostId,
    ) -> Result<Vec<forum_replies::Model>, ForumError> {
        if self.find_post(post_id).await?.is_none() {
            return Err(ForumError::PostNotFound(post_id));
        }

        let replies = forum_replies::Entity::find()
            .filter(forum_replies::Column::PostId.eq(post_id.into_inner()))
            .order_by_asc(forum_replies::Column::CreatedAt)
            .order_by_asc(forum_replies::Column::Id)
            .all(&self.db)
            .await?;
        Ok(replies)
    }

    /// IDs of all replies to a post.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn reply_ids(&self, post_id: PostId) -> Result<Vec<ReplyId>, ForumError> {
        let ids: Vec<i64> = forum_replies::Entity::find()
            .select_only()
            .column(forum_replies::Column::Id)
            .filter(forum_replies::Column::PostId.eq(post_id.into_inner()))
            .into_tuple()
            .all(&self.db)
            .await?;
        Ok(ids.into_iter().map(ReplyId::new).collect())
    }

    /// Finds a reply by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_reply(
        &self,
        id: ReplyId,
    ) -> Result<Option<forum_replies::Model>, ForumError> {
        let reply = forum_replies::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(reply)
    }

    /// Creates a reply on a post.
    ///
    /// # Errors
    ///
    /// Returns `PostNotFound` if the post does not exist.
    pub async fn create_reply(
        &self,
        post_id: PostId,
        author_id: UserId,
        content: String,
    ) -> Result<forum_replies::Model, ForumError> {
        if self.find_post(post_id).await?.is_none() {
            return Err(ForumError::PostNotFound(post_id));
        }

        let reply = forum_replies::ActiveModel {
            content: Set(content),
            author_id: Set(author_id.into_inner()),
            post_id: Set(post_id.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(reply.insert(&self.db).await?)
    }

    /// Replaces the content of a reply.
    ///
    /// # Errors
    ///
    /// Returns `ReplyNotFound` if the reply does not exist.
    pub async fn update_reply(
        &self,
        id: ReplyId,
        content: String,
    ) -> Result<forum_replies::Model, ForumError> {
        let reply = self
            .find_reply(id)
            .await?
            .ok_or(ForumError::ReplyNotFound(id))?;

        let mut active: forum_replies::ActiveModel = reply.into();
        active.content = Set(content);

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a reply.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_reply(&self, id: ReplyId) -> Result<bool, ForumError> {
        let result = forum_replies::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Clusters
    // ========================================================================

    /// Lists clusters by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_clusters(&self) -> Result<Vec<forum_clusters::Model>, ForumError> {
        let clusters = forum_clusters::Entity::find()
            .order_by_asc(forum_clusters::Column::Name)
            .all(&self.db)
            .await?;
        Ok(clusters)
    }

    /// Finds a cluster by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_cluster(
        &self,
        id: ClusterId,
    ) -> Result<Option<forum_clusters::Model>, ForumError> {
        let cluster = forum_clusters::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(cluster)
    }

    /// Creates a cluster.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateClusterName` if the name is taken.
    pub async fn create_cluster(
        &self,
        input: CreateClusterInput,
    ) -> Result<forum_clusters::Model, ForumError> {
        if self.cluster_name_exists(&input.name, None).await? {
            return Err(ForumError::DuplicateClusterName(input.name));
        }

        let cluster = forum_clusters::ActiveModel {
            name: Set(input.name),
            description: Set(input.description),
            author_id: Set(input.author_id.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(cluster.insert(&self.db).await?)
    }

    /// Updates a cluster.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Cluster not found
    /// - New name already taken by another cluster
    pub async fn update_cluster(
        &self,
        id: ClusterId,
        input: UpdateClusterInput,
    ) -> Result<forum_clusters::Model, ForumError> {
        let cluster = self
            .find_cluster(id)
            .await?
            .ok_or(ForumError::ClusterNotFound(id))?;

        if let Some(name) = &input.name
            && *name != cluster.name
            && self.cluster_name_exists(name, Some(id)).await?
        {
            return Err(ForumError::DuplicateClusterName(name.clone()));
        }

        let mut active: forum_clusters::ActiveModel = cluster.into();
        if let Some(name) = input.name {
            active.name = Set(name);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a cluster. Its posts are unlinked, not deleted.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete_cluster(&self, id: ClusterId) -> Result<bool, ForumError> {
        let result = forum_clusters::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    async fn cluster_name_exists(
        &self,
        name: &str,
        exclude: Option<ClusterId>,
    ) -> Result<bool, ForumError> {
        let mut query =
            forum_clusters::Entity::find().filter(forum_clusters::Column::Name.eq(name));
        if let Some(id) = exclude {
            query = query.filter(forum_clusters::Column::Id.ne(id.into_inner()));
        }
        Ok(query.count(&self.db).await? > 0)
    }
}
