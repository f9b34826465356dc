//! Attachment repository for database operations.
//!
//! Implements the core attachment persistence traits using SeaORM. Writes go
//! through [`AttachmentTransaction`], which owns a database transaction.

use chrono::Utc;
use sea_orm::sea_query::SimpleExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction,
    EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use campus_core::attachment::{
    Attachment, AttachmentError, AttachmentParent, AttachmentRepository as AttachmentRepoTrait,
    AttachmentUnitOfWork, NewAttachment,
};
use campus_shared::types::{AttachmentId, EventId, LessonId, PostId, ReplyId};

use crate::entities::{attachments, events, forum_posts, forum_replies, lessons};

/// Attachment repository implementation.
#[derive(Debug, Clone)]
pub struct AttachmentRepository {
    db: DatabaseConnection,
}

impl AttachmentRepository {
    /// Create a new attachment repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Attachments of any of several parents of the same kind, newest first.
    ///
    /// Used to list a post together with all of its replies in one query.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list_by_parents(
        &self,
        parents: &[AttachmentParent],
    ) -> Result<Vec<Attachment>, AttachmentError> {
        if parents.is_empty() {
            return Ok(Vec::new());
        }

        let filter = parents
            .iter()
            .fold(Condition::any(), |cond, parent| cond.add(parent_filter(*parent)));

        let models = attachments::Entity::find()
            .filter(filter)
            .order_by_desc(attachments::Column::CreatedAt)
            .order_by_desc(attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }
}

/// Attachment writes inside one database transaction.
pub struct AttachmentTransaction {
    txn: DatabaseTransaction,
}

impl AttachmentUnitOfWork for AttachmentTransaction {
    async fn insert(&mut self, input: NewAttachment) -> Result<Attachment, AttachmentError> {
        let active_model = attachments::ActiveModel {
            post_id: Set(input.parent.post_id().map(PostId::into_inner)),
            reply_id: Set(input.parent.reply_id().map(ReplyId::into_inner)),
            event_id: Set(input.parent.event_id().map(EventId::into_inner)),
            lesson_id: Set(input.parent.lesson_id().map(LessonId::into_inner)),
            file_name: Set(input.filename),
            storage_key: Set(input.storage_key),
            content_type: Set(input.content_type),
            byte_size: Set(input.byte_size),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };

        let model = active_model
            .insert(&self.txn)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        to_domain(model)
    }

    async fn delete(&mut self, id: AttachmentId) -> Result<bool, AttachmentError> {
        let result = attachments::Entity::delete_by_id(id.into_inner())
            .exec(&self.txn)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(result.rows_affected > 0)
    }

    async fn commit(self) -> Result<(), AttachmentError> {
        self.txn
            .commit()
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }

    async fn rollback(self) -> Result<(), AttachmentError> {
        self.txn
            .rollback()
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))
    }
}

impl AttachmentRepoTrait for AttachmentRepository {
    type UnitOfWork = AttachmentTransaction;

    async fn begin(&self) -> Result<AttachmentTransaction, AttachmentError> {
        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(AttachmentTransaction { txn })
    }

    async fn parent_exists(&self, parent: AttachmentParent) -> Result<bool, AttachmentError> {
        let count = match parent {
            AttachmentParent::Post(id) => {
                forum_posts::Entity::find_by_id(id.into_inner())
                    .count(&self.db)
                    .await
            }
            AttachmentParent::Reply(id) => {
                forum_replies::Entity::find_by_id(id.into_inner())
                    .count(&self.db)
                    .await
            }
            AttachmentParent::Event(id) => {
                events::Entity::find_by_id(id.into_inner())
                    .count(&self.db)
                    .await
            }
            AttachmentParent::Lesson(id) => {
                lessons::Entity::find_by_id(id.into_inner())
                    .count(&self.db)
                    .await
            }
        }
        .map_err(|e| AttachmentError::repository(e.to_string()))?;

        Ok(count > 0)
    }

    async fn find_by_id(&self, id: AttachmentId) -> Result<Option<Attachment>, AttachmentError> {
        let model = attachments::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        model.map(to_domain).transpose()
    }

    async fn list_by_parent(
        &self,
        parent: AttachmentParent,
    ) -> Result<Vec<Attachment>, AttachmentError> {
        let models = attachments::Entity::find()
            .filter(parent_filter(parent))
            .order_by_desc(attachments::Column::CreatedAt)
            .order_by_desc(attachments::Column::Id)
            .all(&self.db)
            .await
            .map_err(|e| AttachmentError::repository(e.to_string()))?;

        models.into_iter().map(to_domain).collect()
    }
}

fn parent_filter(parent: AttachmentParent) -> SimpleExpr {
    match parent {
        AttachmentParent::Post(id) => attachments::Column::PostId.eq(id.into_inner()),
        AttachmentParent::Reply(id) => attachments::Column::ReplyId.eq(id.into_inner()),
        AttachmentParent::Event(id) => attachments::Column::EventId.eq(id.into_inner()),
        AttachmentParent::Lesson(id) => attachments::Column::LessonId.eq(id.into_inner()),
    }
}

/// Convert database model to domain model.
fn to_domain(model: attachments::Model) -> Result<Attachment, AttachmentError> {
    let parent = AttachmentParent::from_columns(
        model.post_id,
        model.reply_id,
        model.event_id,
        model.lesson_id,
    )
    .ok_or_else(|| {
        AttachmentError::repository(format!(
            "attachment {} does not have exactly one parent",
            model.id
        ))
    })?;

    Ok(Attachment {
        id: AttachmentId::new(model.id),
        parent,
        filename: model.file_name,
        storage_key: model.storage_key,
        content_type: model.content_type,
        byte_size: model.byte_size,
        created_at: model.created_at.with_timezone(&Utc),
    })
}
