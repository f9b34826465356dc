//! `SeaORM` entity prelude.

pub use super::answers::Entity as Answers;
pub use super::attachments::Entity as Attachments;
pub use super::events::Entity as Events;
pub use super::forum_clusters::Entity as ForumClusters;
pub use super::forum_posts::Entity as ForumPosts;
pub use super::forum_replies::Entity as ForumReplies;
pub use super::lesson_categories::Entity as LessonCategories;
pub use super::lessons::Entity as Lessons;
pub use super::questions::Entity as Questions;
pub use super::users::Entity as Users;
