//! Blob storage for file attachments using Apache OpenDAL.
//!
//! This module provides vendor-agnostic object storage with support for:
//! - S3-compatible: AWS S3, Cloudflare R2, MinIO
//! - Local filesystem (development only)
//! - In-memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                 BlobStore (put / get / delete)                   │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                      Apache OpenDAL                              │
//! │ op.write("key", data)   │ op.read("key")   │ op.delete("key")    │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod blob;
mod config;
mod error;
mod service;

pub use blob::BlobStore;
pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use service::StorageService;
