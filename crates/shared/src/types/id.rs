//! Typed IDs for type-safe entity references.
//!
//! Rows use `BIGSERIAL` keys, so every ID wraps an `i64`. Using typed IDs
//! prevents accidentally passing a `ReplyId` where a `PostId` is expected.

use serde::{Deserialize, Serialize};

/// Macro to generate typed ID wrappers.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Wraps a raw database key.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Returns the raw database key.
            #[must_use]
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(ClusterId, "Unique identifier for a forum cluster.");
typed_id!(PostId, "Unique identifier for a forum post.");
typed_id!(ReplyId, "Unique identifier for a forum reply.");
typed_id!(AttachmentId, "Unique identifier for a file attachment.");
typed_id!(EventId, "Unique identifier for a calendar event.");
typed_id!(LessonId, "Unique identifier for a lesson.");
typed_id!(CategoryId, "Unique identifier for a lesson category.");
typed_id!(QuestionId, "Unique identifier for a question.");
typed_id!(AnswerId, "Unique identifier for an answer.");

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
