//! Attachment types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};

use campus_shared::types::{AttachmentId, EventId, LessonId, PostId, ReplyId};

/// What an attachment belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttachmentParent {
    /// Attached to a forum post.
    Post(PostId),
    /// Attached to a forum reply.
    Reply(ReplyId),
    /// An image of a calendar event.
    Event(EventId),
    /// The file of a lesson.
    Lesson(LessonId),
}

/// The kind of an [`AttachmentParent`], without its ID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentKind {
    /// Forum post.
    Post,
    /// Forum reply.
    Reply,
    /// Calendar event.
    Event,
    /// Lesson.
    Lesson,
}

impl AttachmentParent {
    /// The kind of parent.
    #[must_use]
    pub const fn kind(self) -> ParentKind {
        match self {
            Self::Post(_) => ParentKind::Post,
            Self::Reply(_) => ParentKind::Reply,
            Self::Event(_) => ParentKind::Event,
            Self::Lesson(_) => ParentKind::Lesson,
        }
    }

    /// Returns the post ID if the parent is a post.
    #[must_use]
    pub const fn post_id(self) -> Option<PostId> {
        match self {
            Self::Post(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the reply ID if the parent is a reply.
    #[must_use]
    pub const fn reply_id(self) -> Option<ReplyId> {
        match self {
            Self::Reply(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the event ID if the parent is an event.
    #[must_use]
    pub const fn event_id(self) -> Option<EventId> {
        match self {
            Self::Event(id) => Some(id),
            _ => None,
        }
    }

    /// Returns the lesson ID if the parent is a lesson.
    #[must_use]
    pub const fn lesson_id(self) -> Option<LessonId> {
        match self {
            Self::Lesson(id) => Some(id),
            _ => None,
        }
    }

    /// Rebuilds a parent from the nullable foreign keys of a stored row.
    ///
    /// Returns `None` unless exactly one of them is set.
    #[must_use]
    pub fn from_columns(
        post_id: Option<i64>,
        reply_id: Option<i64>,
        event_id: Option<i64>,
        lesson_id: Option<i64>,
    ) -> Option<Self> {
        match (post_id, reply_id, event_id, lesson_id) {
            (Some(id), None, None, None) => Some(Self::Post(PostId::new(id))),
            (None, Some(id), None, None) => Some(Self::Reply(ReplyId::new(id))),
            (None, None, Some(id), None) => Some(Self::Event(EventId::new(id))),
            (None, None, None, Some(id)) => Some(Self::Lesson(LessonId::new(id))),
            _ => None,
        }
    }

    /// Key prefix under which this parent's blobs live.
    pub(crate) fn key_prefix(self) -> String {
        match self {
            Self::Post(id) => format!("attachments/{id}"),
            Self::Reply(id) => format!("attachments/replies/{id}"),
            Self::Event(id) => format!("events/{id}"),
            Self::Lesson(id) => format!("lessons/{id}"),
        }
    }
}

impl std::fmt::Display for AttachmentParent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post(id) => write!(f, "post {id}"),
            Self::Reply(id) => write!(f, "reply {id}"),
            Self::Event(id) => write!(f, "event {id}"),
            Self::Lesson(id) => write!(f, "lesson {id}"),
        }
    }
}

/// An inbound file, already extracted from the request.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    /// Where the file is attached.
    pub parent: AttachmentParent,
    /// Original filename as supplied by the client.
    pub filename: String,
    /// Declared MIME type.
    pub content_type: String,
    /// Raw file content.
    pub content: Bytes,
}

/// Metadata row to insert after the blob is stored.
#[derive(Debug, Clone)]
pub struct NewAttachment {
    /// Where the file is attached.
    pub parent: AttachmentParent,
    /// Original filename.
    pub filename: String,
    /// Blob store key.
    pub storage_key: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub byte_size: i64,
}

/// Attachment domain model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Unique identifier.
    pub id: AttachmentId,
    /// Where the file is attached.
    pub parent: AttachmentParent,
    /// Original filename.
    pub filename: String,
    /// Blob store key.
    pub storage_key: String,
    /// MIME type.
    pub content_type: String,
    /// Size in bytes.
    pub byte_size: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parent_accessors() {
        let post = AttachmentParent::Post(PostId::new(42));
        assert_eq!(post.post_id(), Some(PostId::new(42)));
        assert_eq!(post.reply_id(), None);
        assert_eq!(post.kind(), ParentKind::Post);

        let reply = AttachmentParent::Reply(ReplyId::new(7));
        assert_eq!(reply.post_id(), None);
        assert_eq!(reply.reply_id(), Some(ReplyId::new(7)));

        let event = AttachmentParent::Event(EventId::new(3));
        assert_eq!(event.event_id(), Some(EventId::new(3)));
        assert_eq!(event.lesson_id(), None);
        assert_eq!(event.kind(), ParentKind::Event);

        let lesson = AttachmentParent::Lesson(LessonId::new(5));
        assert_eq!(lesson.lesson_id(), Some(LessonId::new(5)));
        assert_eq!(lesson.post_id(), None);
    }

    #[test]
    fn test_parent_from_columns_requires_exactly_one() {
        assert_eq!(
            AttachmentParent::from_columns(Some(1), None, None, None),
            Some(AttachmentParent::Post(PostId::new(1)))
        );
        assert_eq!(
            AttachmentParent::from_columns(None, Some(2), None, None),
            Some(AttachmentParent::Reply(ReplyId::new(2)))
        );
        assert_eq!(
            AttachmentParent::from_columns(None, None, Some(3), None),
            Some(AttachmentParent::Event(EventId::new(3)))
        );
        assert_eq!(
            AttachmentParent::from_columns(None, None, None, Some(4)),
            Some(AttachmentParent::Lesson(LessonId::new(4)))
        );
        assert_eq!(AttachmentParent::from_columns(None, None, None, None), None);
        assert_eq!(AttachmentParent::from_columns(Some(1), Some(2), None, None), None);
        assert_eq!(AttachmentParent::from_columns(None, None, Some(3), Some(4)), None);
    }

    #[test]
    fn test_parent_display() {
        assert_eq!(AttachmentParent::Post(PostId::new(3)).to_string(), "post 3");
        assert_eq!(AttachmentParent::Reply(ReplyId::new(4)).to_string(), "reply 4");
        assert_eq!(AttachmentParent::Event(EventId::new(5)).to_string(), "event 5");
        assert_eq!(AttachmentParent::Lesson(LessonId::new(6)).to_string(), "lesson 6");
    }

    #[test]
    fn test_key_prefixes_are_disjoint() {
        assert_eq!(AttachmentParent::Post(PostId::new(1)).key_prefix(), "attachments/1");
        assert_eq!(
            AttachmentParent::Reply(ReplyId::new(1)).key_prefix(),
            "attachments/replies/1"
        );
        assert_eq!(AttachmentParent::Event(EventId::new(1)).key_prefix(), "events/1");
        assert_eq!(AttachmentParent::Lesson(LessonId::new(1)).key_prefix(), "lessons/1");
    }
}
