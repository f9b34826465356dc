//! Blob store capability consumed by the attachment workflow.

use std::future::Future;

use bytes::Bytes;

use super::error::StorageError;

/// Key-addressed storage of opaque byte blobs.
///
/// Implementations must treat a `put` on an existing key as an overwrite and
/// a `delete` on a missing key as success.
pub trait BlobStore: Send + Sync {
    /// Stores `data` under `key`.
    fn put(&self, key: &str, data: Bytes)
    -> impl Future<Output = Result<(), StorageError>> + Send;

    /// Reads the blob stored under `key`.
    fn get(&self, key: &str) -> impl Future<Output = Result<Bytes, StorageError>> + Send;

    /// Removes the blob stored under `key`.
    fn delete(&self, key: &str) -> impl Future<Output = Result<(), StorageError>> + Send;
}
