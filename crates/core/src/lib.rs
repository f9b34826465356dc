//! Core business logic for Campus.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! Persistence is reached only through the repository traits it defines.
//!
//! # Modules
//!
//! - `attachment` - File attachment policy and the upload/delete/fetch workflow
//! - `storage` - Vendor-agnostic blob storage on Apache OpenDAL
//! - `auth` - Password hashing and user roles

pub mod attachment;
pub mod auth;
pub mod storage;
