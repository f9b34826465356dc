//! Repository abstractions for data access.
//!
//! Repositories provide a clean interface for database operations,
//! hiding the `SeaORM` implementation details from the rest of the application.

pub mod attachment;
pub mod event;
pub mod forum;
pub mod lesson;
pub mod question;
pub mod user;

pub use attachment::{AttachmentRepository, AttachmentTransaction};
pub use event::{CreateEventInput, EventError, EventRepository, UpdateEventInput};
pub use forum::{
    CreateClusterInput, CreatePostInput, ForumError, ForumRepository, UpdateClusterInput,
    UpdatePostInput,
};
pub use lesson::{CreateLessonInput, LessonError, LessonRepository, UpdateLessonInput};
pub use question::{QuestionError, QuestionRepository};
pub use user::{CreateUserInput, UpdateUserInput, UserError, UserRepository, role_of};
