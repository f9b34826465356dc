//! Attachment service implementation.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use campus_shared::types::AttachmentId;

use super::error::AttachmentError;
use super::policy::{AttachmentPolicy, storage_key};
use super::repository::{AttachmentRepository, AttachmentUnitOfWork};
use super::types::{Attachment, AttachmentParent, NewAttachment, UploadRequest};
use crate::storage::{BlobStore, StorageService};

/// Attachment service for managing file attachments.
///
/// Keeps the blob store and the metadata store in step: a committed record
/// always points at a stored blob.
pub struct AttachmentService<R: AttachmentRepository, S: BlobStore = StorageService> {
    policy: AttachmentPolicy,
    storage: Arc<S>,
    repo: Arc<R>,
}

impl<R: AttachmentRepository, S: BlobStore> AttachmentService<R, S> {
    /// Create a new attachment service.
    #[must_use]
    pub fn new(policy: AttachmentPolicy, storage: Arc<S>, repo: Arc<R>) -> Self {
        Self {
            policy,
            storage,
            repo,
        }
    }

    /// The upload policy in force.
    #[must_use]
    pub fn policy(&self) -> &AttachmentPolicy {
        &self.policy
    }

    /// Upload a file and record its metadata.
    ///
    /// Every upload gets its own storage key, so two uploads never share a
    /// blob. The blob is written first. If the metadata insert then fails, the
    /// blob is removed again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file violates the upload policy for its kind of parent
    /// - The parent does not exist
    /// - The blob upload fails (nothing is persisted)
    /// - The metadata insert fails (the blob is compensated)
    pub async fn upload(&self, request: UploadRequest) -> Result<Attachment, AttachmentError> {
        let UploadRequest {
            parent,
            filename,
            content_type,
            content,
        } = request;

        debug!(
            parent = %parent,
            filename = %filename,
            content_type = %content_type,
            size = content.len(),
            "Attachment upload started"
        );

        self.policy
            .validate_for(parent.kind(), &filename, &content_type, content.len())?;

        // Verify parent exists
        if !self.repo.parent_exists(parent).await? {
            return Err(AttachmentError::ParentNotFound(parent));
        }

        let key = storage_key(parent, Uuid::now_v7(), &filename);

        let byte_size = i64::try_from(content.len())
            .map_err(|_| AttachmentError::FileTooLarge {
                size: u64::MAX,
                max: self.policy.max_file_size_bytes(),
            })?;

        self.store_blob(&key, content).await?;

        let new_attachment = NewAttachment {
            parent,
            filename,
            storage_key: key,
            content_type,
            byte_size,
        };

        match self.persist(new_attachment.clone()).await {
            Ok(attachment) => {
                info!(
                    attachment_id = %attachment.id,
                    parent = %parent,
                    storage_key = %attachment.storage_key,
                    byte_size,
                    "Attachment uploaded"
                );
                Ok(attachment)
            }
            Err(cause) => {
                self.compensate(&new_attachment.storage_key).await;
                Err(AttachmentError::MetadataPersistFailed(cause.to_string()))
            }
        }
    }

    /// Upload a file that supersedes every earlier attachment of its parent.
    ///
    /// The new file is stored first. Older attachments are then deleted one by
    /// one; one that cannot be removed is logged and left in place.
    ///
    /// # Errors
    ///
    /// Same as [`upload`](Self::upload). Failures removing older files are not
    /// reported.
    pub async fn replace(&self, request: UploadRequest) -> Result<Attachment, AttachmentError> {
        let parent = request.parent;
        let attachment = self.upload(request).await?;

        let previous = match self.list(parent).await {
            Ok(previous) => previous,
            Err(e) => {
                warn!(parent = %parent, error = %e, "Could not list superseded attachments");
                return Ok(attachment);
            }
        };

        for old in previous.into_iter().filter(|a| a.id != attachment.id) {
            if let Err(e) = self.delete(old.id).await {
                warn!(
                    attachment_id = %old.id,
                    parent = %parent,
                    error = %e,
                    "Superseded attachment kept"
                );
            }
        }

        Ok(attachment)
    }

    /// Get attachment metadata.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, or a repository error.
    pub async fn get(&self, id: AttachmentId) -> Result<Attachment, AttachmentError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(AttachmentError::NotFound(id))
    }

    /// List attachments of a parent, newest first.
    ///
    /// # Errors
    ///
    /// Returns a repository error if the query fails.
    pub async fn list(&self, parent: AttachmentParent) -> Result<Vec<Attachment>, AttachmentError> {
        self.repo.list_by_parent(parent).await
    }

    /// Get attachment metadata together with its content.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no record exists, or `StorageFetchFailed` if the
    /// blob cannot be read.
    pub async fn fetch(&self, id: AttachmentId) -> Result<(Attachment, Bytes), AttachmentError> {
        let attachment = self.get(id).await?;

        let content = self
            .storage
            .get(&attachment.storage_key)
            .await
            .map_err(AttachmentError::StorageFetchFailed)?;

        Ok((attachment, content))
    }

    /// Delete an attachment.
    ///
    /// The blob goes first. If that fails the record is left untouched and
    /// the caller may retry.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Attachment not found
    /// - The blob delete fails (the record is kept)
    /// - The metadata delete fails
    pub async fn delete(&self, id: AttachmentId) -> Result<(), AttachmentError> {
        let attachment = self.get(id).await?;

        // Delete from storage first
        if let Err(e) = self.storage.delete(&attachment.storage_key).await {
            warn!(
                attachment_id = %id,
                storage_key = %attachment.storage_key,
                error = %e,
                "Blob delete failed; keeping attachment record"
            );
            return Err(AttachmentError::StorageDeleteFailed(e));
        }

        let mut uow = self.repo.begin().await?;
        match uow.delete(id).await {
            Ok(true) => uow.commit().await?,
            Ok(false) => {
                Self::rollback(uow).await;
                return Err(AttachmentError::NotFound(id));
            }
            Err(e) => {
                Self::rollback(uow).await;
                return Err(e);
            }
        }

        info!(
            attachment_id = %id,
            storage_key = %attachment.storage_key,
            "Attachment deleted"
        );
        Ok(())
    }

    /// Delete every attachment of a parent. Returns how many were removed.
    ///
    /// Stops at the first failure; attachments already removed stay removed.
    ///
    /// # Errors
    ///
    /// Returns the first error from listing or from [`delete`](Self::delete).
    pub async fn purge_parent(&self, parent: AttachmentParent) -> Result<usize, AttachmentError> {
        let attachments = self.list(parent).await?;
        let total = attachments.len();

        for attachment in attachments {
            self.delete(attachment.id).await?;
        }

        debug!(parent = %parent, count = total, "Purged attachments");
        Ok(total)
    }

    async fn store_blob(&self, key: &str, content: Bytes) -> Result<(), AttachmentError> {
        self.storage.put(key, content).await.map_err(|e| {
            error!(storage_key = %key, error = %e, "Blob upload failed");
            AttachmentError::StorageUploadFailed(e)
        })
    }

    async fn persist(&self, new_attachment: NewAttachment) -> Result<Attachment, AttachmentError> {
        let mut uow = self.repo.begin().await?;

        match uow.insert(new_attachment).await {
            Ok(attachment) => {
                uow.commit().await?;
                Ok(attachment)
            }
            Err(e) => {
                Self::rollback(uow).await;
                Err(e)
            }
        }
    }

    /// Remove a blob whose metadata could not be saved.
    async fn compensate(&self, key: &str) {
        match self.storage.delete(key).await {
            Ok(()) => warn!(storage_key = %key, "Removed blob after metadata persist failure"),
            Err(e) => error!(
                storage_key = %key,
                error = %e,
                "Failed to remove blob after metadata persist failure; blob is orphaned"
            ),
        }
    }

    async fn rollback(uow: R::UnitOfWork) {
        if let Err(e) = uow.rollback().await {
            error!(error = %e, "Failed to roll back attachment unit of work");
        }
    }
}
