//! Shared types, errors, and configuration for Campus.
//!
//! This crate provides common types used across all other crates:
//! - Typed IDs for type-safe entity references
//! - JWT claims, token service, and auth payloads
//! - Application-wide error types
//! - Configuration management

pub mod auth;
pub mod config;
pub mod error;
pub mod jwt;
pub mod types;

pub use auth::{Claims, TokenKind};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use jwt::{JwtConfig, JwtError, JwtService};
