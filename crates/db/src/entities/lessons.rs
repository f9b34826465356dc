//! `SeaORM` Entity for lessons table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "lessons")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub is_audio: bool,
    pub category_id: i64,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::lesson_categories::Entity",
        from = "Column::CategoryId",
        to = "super::lesson_categories::Column::Id",
        on_delete = "Restrict"
    )]
    LessonCategories,
    #[sea_orm(has_many = "super::attachments::Entity")]
    Attachments,
}

impl Related<super::lesson_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LessonCategories.def()
    }
}

impl Related<super::attachments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attachments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
