//! `SeaORM` Entity for attachments table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "attachments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub post_id: Option<i64>,
    pub reply_id: Option<i64>,
    pub event_id: Option<i64>,
    pub lesson_id: Option<i64>,
    pub file_name: String,
    #[sea_orm(unique)]
    pub storage_key: String,
    pub content_type: String,
    pub byte_size: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::forum_posts::Entity",
        from = "Column::PostId",
        to = "super::forum_posts::Column::Id",
        on_delete = "Restrict"
    )]
    ForumPosts,
    #[sea_orm(
        belongs_to = "super::forum_replies::Entity",
        from = "Column::ReplyId",
        to = "super::forum_replies::Column::Id",
        on_delete = "Restrict"
    )]
    ForumReplies,
    #[sea_orm(
        belongs_to = "super::events::Entity",
        from = "Column::EventId",
        to = "super::events::Column::Id",
        on_delete = "Restrict"
    )]
    Events,
    #[sea_orm(
        belongs_to = "super::lessons::Entity",
        from = "Column::LessonId",
        to = "super::lessons::Column::Id",
        on_delete = "Restrict"
    )]
    Lessons,
}

impl Related<super::forum_posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumPosts.def()
    }
}

impl Related<super::forum_replies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumReplies.def()
    }
}

impl Related<super::events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl Related<super::lessons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Lessons.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
