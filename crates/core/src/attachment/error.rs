//! Attachment error types.

use thiserror::Error;

use campus_shared::types::AttachmentId;

use super::types::AttachmentParent;
use crate::storage::StorageError;

/// Coarse classification of [`AttachmentError`], used for status mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachmentErrorKind {
    /// Rejected by policy before any I/O.
    Validation,
    /// Parent or attachment does not exist.
    NotFound,
    /// Blob store call failed.
    Storage,
    /// Metadata could not be persisted or read.
    Persist,
}

/// Attachment operation errors.
#[derive(Debug, Error)]
pub enum AttachmentError {
    /// File too large.
    #[error("file too large: {size} bytes exceeds maximum {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// MIME type outside the allow-list.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// Filename extension does not match the declared type.
    #[error("filename '{filename}' does not end with '{expected}'")]
    ExtensionMismatch {
        /// Filename as supplied.
        filename: String,
        /// Extension required by the declared type.
        expected: String,
    },

    /// Filename longer than metadata can hold.
    #[error("filename is {length} characters, maximum is {max}")]
    FilenameTooLong {
        /// Filename length in characters.
        length: usize,
        /// Maximum allowed length.
        max: usize,
    },

    /// No content.
    #[error("file is empty")]
    EmptyFile,

    /// Parent post, reply, event or lesson not found.
    #[error("{0} not found")]
    ParentNotFound(AttachmentParent),

    /// Attachment not found.
    #[error("attachment not found: {0}")]
    NotFound(AttachmentId),

    /// Blob upload failed. Nothing was persisted.
    #[error("failed to upload file to storage")]
    StorageUploadFailed(#[source] StorageError),

    /// Blob delete failed. The metadata row was kept.
    #[error("failed to delete file from storage")]
    StorageDeleteFailed(#[source] StorageError),

    /// Blob read failed.
    #[error("failed to fetch file from storage")]
    StorageFetchFailed(#[source] StorageError),

    /// Metadata insert failed after the blob was stored.
    #[error("failed to persist attachment metadata: {0}")]
    MetadataPersistFailed(String),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl AttachmentError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Returns the coarse kind of this error.
    #[must_use]
    pub const fn kind(&self) -> AttachmentErrorKind {
        match self {
            Self::FileTooLarge { .. }
            | Self::UnsupportedFileType(_)
            | Self::ExtensionMismatch { .. }
            | Self::FilenameTooLong { .. }
            | Self::EmptyFile => AttachmentErrorKind::Validation,
            Self::ParentNotFound(_) | Self::NotFound(_) => AttachmentErrorKind::NotFound,
            Self::StorageUploadFailed(_)
            | Self::StorageDeleteFailed(_)
            | Self::StorageFetchFailed(_) => AttachmentErrorKind::Storage,
            Self::MetadataPersistFailed(_) | Self::Repository(_) => AttachmentErrorKind::Persist,
        }
    }

    /// Stable machine-readable code for API responses.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::FileTooLarge { .. } => "file_too_large",
            Self::UnsupportedFileType(_) => "unsupported_file_type",
            Self::ExtensionMismatch { .. } => "extension_mismatch",
            Self::FilenameTooLong { .. } => "filename_too_long",
            Self::EmptyFile => "empty_file",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::NotFound(_) => "attachment_not_found",
            Self::StorageUploadFailed(_) => "storage_upload_failed",
            Self::StorageDeleteFailed(_) => "storage_delete_failed",
            Self::StorageFetchFailed(_) => "storage_fetch_failed",
            Self::MetadataPersistFailed(_) => "metadata_persist_failed",
            Self::Repository(_) => "internal_error",
        }
    }
}
