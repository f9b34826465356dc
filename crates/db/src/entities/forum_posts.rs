//! `SeaORM` Entity for forum_posts table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "forum_posts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub author_id: i64,
    pub cluster_id: Option<i64>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::Id"
    )]
    Users,
    #[sea_orm(
        belongs_to = "super::forum_clusters::Entity",
        from = "Column::ClusterId",
        to = "super::forum_clusters::Column::Id",
        on_delete = "SetNull"
    )]
    ForumClusters,
    #[sea_orm(has_many = "super::forum_replies::Entity")]
    ForumReplies,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::forum_clusters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumClusters.def()
    }
}

impl Related<super::forum_replies::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumReplies.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
