//! `SeaORM` Entity for users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub class_cycle: Option<i32>,
    pub role: UserRole,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::forum_posts::Entity")]
    ForumPosts,
    #[sea_orm(has_many = "super::forum_replies::Entity")]
    ForumReplies,
    #[sea_orm(has_many = "super::forum_clusters::Entity")]
    ForumClusters,
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

impl Related<super::forum_clusters::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ForumClusters.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
