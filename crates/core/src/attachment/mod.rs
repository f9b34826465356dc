//! Stored files: forum post and reply attachments, event images and lesson files.
//!
//! This module provides:
//! - Upload policy (size, MIME allow-list per kind of parent, extension match)
//! - Storage key derivation, unique per upload
//! - The upload workflow with blob compensation on metadata failure
//! - Deletion that never drops a record whose blob still exists
//! - Retrieval of metadata and content

mod error;
mod policy;
mod repository;
mod service;
mod types;


pub use error::{AttachmentError, AttachmentErrorKind};
pub use policy::{AttachmentPolicy, MAX_FILE_SIZE_MB, MAX_FILENAME_LENGTH, storage_key};
pub use repository::{AttachmentRepository, AttachmentUnitOfWork};
pub use service::AttachmentService;
pub use types::{Attachment, AttachmentParent, NewAttachment, ParentKind, UploadRequest};
