//! `SeaORM` entity definitions.

pub mod prelude;

pub mod answers;
pub mod attachments;
pub mod events;
pub mod forum_clusters;
pub mod forum_posts;
pub mod forum_replies;
pub mod lesson_categories;
pub mod lessons;
pub mod questions;
pub mod sea_orm_active_enums;
pub mod users;
