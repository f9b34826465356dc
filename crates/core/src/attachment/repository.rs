//! Persistence seams for attachment metadata.

use std::future::Future;

use campus_shared::types::AttachmentId;

use super::error::AttachmentError;
use super::types::{Attachment, AttachmentParent, NewAttachment};

/// A unit of work over attachment metadata.
///
/// Writes become visible only after [`commit`](Self::commit). Dropping the
/// unit of work without committing discards them.
pub trait AttachmentUnitOfWork: Send + Sized {
    /// Inserts a metadata row and returns the stored record.
    fn insert(
        &mut self,
        attachment: NewAttachment,
    ) -> impl Future<Output = Result<Attachment, AttachmentError>> + Send;

    /// Deletes a metadata row. Returns `false` if no row matched.
    fn delete(
        &mut self,
        id: AttachmentId,
    ) -> impl Future<Output = Result<bool, AttachmentError>> + Send;

    /// Makes all writes durable.
    fn commit(self) -> impl Future<Output = Result<(), AttachmentError>> + Send;

    /// Discards all writes.
    fn rollback(self) -> impl Future<Output = Result<(), AttachmentError>> + Send;
}

/// Repository for attachment metadata.
pub trait AttachmentRepository: Send + Sync {
    /// Unit of work type handed out by [`begin`](Self::begin).
    type UnitOfWork: AttachmentUnitOfWork;

    /// Opens a unit of work.
    fn begin(&self) -> impl Future<Output = Result<Self::UnitOfWork, AttachmentError>> + Send;

    /// Whether the parent row exists.
    fn parent_exists(
        &self,
        parent: AttachmentParent,
    ) -> impl Future<Output = Result<bool, AttachmentError>> + Send;

    /// Find attachment by ID.
    fn find_by_id(
        &self,
        id: AttachmentId,
    ) -> impl Future<Output = Result<Option<Attachment>, AttachmentError>> + Send;

    /// Attachments of a parent, newest first.
    fn list_by_parent(
        &self,
        parent: AttachmentParent,
    ) -> impl Future<Output = Result<Vec<Attachment>, AttachmentError>> + Send;
}
