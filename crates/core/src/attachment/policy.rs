//! Upload policy and storage key derivation.

use std::collections::BTreeMap;

use uuid::Uuid;

use super::error::AttachmentError;
use super::types::{AttachmentParent, ParentKind};

/// Default maximum attachment size in megabytes.
pub const MAX_FILE_SIZE_MB: u64 = 10;

/// Longest filename, in characters, that metadata can hold.
pub const MAX_FILENAME_LENGTH: usize = 255;

const BYTES_PER_MB: u64 = 1024 * 1024;

const DEFAULT_ALLOWED_TYPES: [(&str, &str); 8] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/gif", ".gif"),
    ("application/pdf", ".pdf"),
    ("application/msword", ".doc"),
    (
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        ".docx",
    ),
    ("text/plain", ".txt"),
    ("text/markdown", ".md"),
];

// Recorded lessons are accepted on top of the shared allow-list.
const LESSON_AUDIO_TYPES: [(&str, &str); 4] = [
    ("audio/mpeg", ".mp3"),
    ("audio/wav", ".wav"),
    ("audio/mp4", ".m4a"),
    ("audio/ogg", ".ogg"),
];

/// What an uploaded file must satisfy before any I/O happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    max_file_size_mb: u64,
    allowed_types: BTreeMap<String, String>,
}

impl Default for AttachmentPolicy {
    fn default() -> Self {
        Self::new(MAX_FILE_SIZE_MB)
    }
}

impl AttachmentPolicy {
    /// Creates a policy with the default MIME allow-list.
    #[must_use]
    pub fn new(max_file_size_mb: u64) -> Self {
        Self {
            max_file_size_mb,
            allowed_types: DEFAULT_ALLOWED_TYPES
                .iter()
                .map(|(mime, ext)| ((*mime).to_string(), (*ext).to_string()))
                .collect(),
        }
    }

    /// Allows an extra MIME type, or replaces the extension of an existing one.
    #[must_use]
    pub fn with_allowed_type(mut self, mime: impl Into<String>, extension: impl Into<String>) -> Self {
        self.allowed_types
            .insert(mime.into(), extension.into().to_ascii_lowercase());
        self
    }

    /// Maximum size in megabytes.
    #[must_use]
    pub const fn max_file_size_mb(&self) -> u64 {
        self.max_file_size_mb
    }

    /// Maximum size in bytes.
    #[must_use]
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(BYTES_PER_MB)
    }

    /// Extension required for a declared MIME type, if it is allowed.
    #[must_use]
    pub fn expected_extension(&self, content_type: &str) -> Option<&str> {
        self.allowed_types.get(content_type).map(String::as_str)
    }

    /// Extension required for a declared MIME type on a given kind of parent.
    ///
    /// Events only take images. Lessons also take [audio](LESSON_AUDIO_TYPES).
    #[must_use]
    pub fn expected_extension_for(&self, kind: ParentKind, content_type: &str) -> Option<&str> {
        match kind {
            ParentKind::Post | ParentKind::Reply => self.expected_extension(content_type),
            ParentKind::Event if content_type.starts_with("image/") => {
                self.expected_extension(content_type)
            }
            ParentKind::Event => None,
            ParentKind::Lesson => self.expected_extension(content_type).or_else(|| {
                LESSON_AUDIO_TYPES
                    .iter()
                    .find(|(mime, _)| *mime == content_type)
                    .map(|(_, ext)| *ext)
            }),
        }
    }

    /// Validates a forum upload. See [`Self::validate_for`].
    ///
    /// # Errors
    ///
    /// Same as [`Self::validate_for`].
    pub fn validate(
        &self,
        filename: &str,
        content_type: &str,
        size: usize,
    ) -> Result<(), AttachmentError> {
        self.validate_for(ParentKind::Post, filename, content_type, size)
    }

    /// Validates an upload for a kind of parent. Checks run in a fixed order and
    /// the first failure wins: size, MIME type, extension, filename length, then
    /// emptiness.
    ///
    /// # Errors
    ///
    /// - `FileTooLarge` if `size` exceeds the limit
    /// - `UnsupportedFileType` if `content_type` is not allowed for `kind`
    /// - `ExtensionMismatch` if `filename` lacks the expected extension (case-insensitive)
    /// - `FilenameTooLong` if `filename` exceeds [`MAX_FILENAME_LENGTH`] characters
    /// - `EmptyFile` if `size` is zero
    pub fn validate_for(
        &self,
        kind: ParentKind,
        filename: &str,
        content_type: &str,
        size: usize,
    ) -> Result<(), AttachmentError> {
        let size = u64::try_from(size).unwrap_or(u64::MAX);
        let max = self.max_file_size_bytes();
        if size > max {
            return Err(AttachmentError::FileTooLarge { size, max });
        }

        let expected = self
            .expected_extension_for(kind, content_type)
            .ok_or_else(|| AttachmentError::UnsupportedFileType(content_type.to_string()))?;

        if !filename.to_ascii_lowercase().ends_with(expected) {
            return Err(AttachmentError::ExtensionMismatch {
                filename: filename.to_string(),
                expected: expected.to_string(),
            });
        }

        let length = filename.chars().count();
        if length > MAX_FILENAME_LENGTH {
            return Err(AttachmentError::FilenameTooLong {
                length,
                max: MAX_FILENAME_LENGTH,
            });
        }

        if size == 0 {
            return Err(AttachmentError::EmptyFile);
        }

        Ok(())
    }
}

/// Derives the blob store key for one upload of a file attached to `parent`.
///
/// Format: `{prefix}/{upload_id}_{filename}`, where the prefix is
/// `attachments/{post_id}`, `attachments/replies/{reply_id}`, `events/{event_id}`
/// or `lessons/{lesson_id}`. The upload ID keeps keys distinct when sanitized
/// names collide or the same name is uploaded twice.
#[must_use]
pub fn storage_key(parent: AttachmentParent, upload_id: Uuid, filename: &str) -> String {
    format!(
        "{}/{}_{}",
        parent.key_prefix(),
        upload_id.simple(),
        sanitize_filename(filename)
    )
}

/// Sanitize filename for storage key.
///
/// Only allows ASCII alphanumeric characters, dots, hyphens, and underscores.
fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use campus_shared::types::PostId;
    use proptest::prelude::*;

    fn sanitized_char(c: char) -> bool {
        c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_'
    }

    proptest! {
        // Oversized content is rejected regardless of type or name.
        #[test]
        fn prop_oversized_always_too_large(
            max_mb in 1u64..20,
            excess in 1usize..4096,
            filename in ".{0,40}",
            content_type in ".{0,40}",
        ) {
            let policy = AttachmentPolicy::new(max_mb);
            let size = usize::try_from(policy.max_file_size_bytes()).unwrap() + excess;

            let is_too_large = matches!(
                policy.validate(&filename, &content_type, size),
                Err(AttachmentError::FileTooLarge { .. })
            );
            prop_assert!(is_too_large);
        }

        // Any type outside the allow-list is rejected for in-limit sizes.
        #[test]
        fn prop_unknown_type_rejected(
            content_type in "[a-z]+/[a-z0-9.+-]+",
            size in 1usize..1024,
        ) {
            let policy = AttachmentPolicy::default();
            prop_assume!(policy.expected_extension(&content_type).is_none());

            let is_unsupported = matches!(
                policy.validate("file.pdf", &content_type, size),
                Err(AttachmentError::UnsupportedFileType(_))
            );
            prop_assert!(is_unsupported);
        }

        // Accepted filenames always carry the expected extension.
        #[test]
        fn prop_accepted_names_end_with_extension(
            stem in "[a-zA-Z0-9_-]{1,30}",
            idx in 0usize..DEFAULT_ALLOWED_TYPES.len(),
            upper in any::<bool>(),
        ) {
            let (mime, ext) = DEFAULT_ALLOWED_TYPES[idx];
            let mut filename = format!("{stem}{ext}");
            if upper {
                filename = filename.to_ascii_uppercase();
            }

            let policy = AttachmentPolicy::default();
            prop_assert!(policy.validate(&filename, mime, 1).is_ok());
        }

        // Sanitized keys contain only safe characters below the parent prefix.
        #[test]
        fn prop_storage_key_is_confined(
            id in 1i64..1_000_000,
            upload in any::<u128>(),
            filename in ".*",
        ) {
            let upload_id = Uuid::from_u128(upload);
            let key = storage_key(AttachmentParent::Post(PostId::new(id)), upload_id, &filename);
            let prefix = format!("attachments/{id}/{}_", upload_id.simple());

            prop_assert!(key.starts_with(&prefix));
            let rest = &key[prefix.len()..];
            prop_assert!(!rest.contains('/'));
            for c in rest.chars() {
                prop_assert!(sanitized_char(c), "Unexpected character in storage key: {}", c);
            }
        }

        // Distinct uploads never share a key, whatever the filenames sanitize to.
        #[test]
        fn prop_distinct_uploads_never_collide(
            a in any::<u128>(),
            b in any::<u128>(),
            first in ".{0,20}",
            second in ".{0,20}",
        ) {
            prop_assume!(a != b);
            let parent = AttachmentParent::Post(PostId::new(1));
            let left = storage_key(parent, Uuid::from_u128(a), &first);
            let right = storage_key(parent, Uuid::from_u128(b), &second);
            prop_assert_ne!(left, right);
        }
    }
}
