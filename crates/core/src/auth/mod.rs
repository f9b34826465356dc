//! Authentication and password hashing.
//!
//! This module provides:
//! - Password hashing with Argon2id
//! - Password verification and length rules
//! - User roles and the permission checks derived from them

mod password;

pub use password::{
    MAX_PASSWORD_LENGTH, MIN_PASSWORD_LENGTH, PasswordError, check_password_policy, hash_password,
    verify_password,
};

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A user's role on the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Read and post in the forum.
    Guest,
    /// Enrolled student, tied to a class cycle.
    Student,
    /// Teaching staff. Assigned by an admin, never self-registered.
    Staff,
    /// Full access, including role assignment and moderation.
    Admin,
}

/// Returned when a string does not name a [`UserRole`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown role '{0}'")]
pub struct UnknownRole(pub String);

impl UserRole {
    /// All roles, lowest privilege first.
    pub const ALL: [Self; 4] = [Self::Guest, Self::Student, Self::Staff, Self::Admin];

    /// Lowercase name, as stored and as carried in tokens.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Student => "student",
            Self::Staff => "staff",
            Self::Admin => "admin",
        }
    }

    /// Returns true for administrators.
    #[must_use]
    pub const fn is_admin(self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Returns true if this role may post questions on the Q&A board.
    #[must_use]
    pub const fn can_ask_questions(self) -> bool {
        !matches!(self, Self::Guest)
    }

    /// Returns true if this role may answer course questions.
    #[must_use]
    pub const fn can_answer_questions(self) -> bool {
        matches!(self, Self::Staff | Self::Admin)
    }

    /// Returns true if this role may edit or delete other users' content.
    #[must_use]
    pub const fn can_moderate(self) -> bool {
        self.is_admin()
    }

    /// Returns true if this role may create posts, replies and clusters.
    #[must_use]
    #[allow(clippy::unused_self)]
    pub const fn can_author(self) -> bool {
        true
    }

    /// Returns true if this role may assign roles to other users.
    #[must_use]
    pub const fn can_manage_users(self) -> bool {
        self.is_admin()
    }

    /// Returns true if a new account may pick this role at registration.
    ///
    /// Admin is still subject to the configured admin email list.
    #[must_use]
    pub const fn can_self_register(self) -> bool {
        !matches!(self, Self::Staff)
    }

    /// Returns true if this role requires a class cycle on the account.
    #[must_use]
    pub const fn requires_class_cycle(self) -> bool {
        matches!(self, Self::Student)
    }

    /// Whether `actor` with this role may modify content owned by `owner`.
    #[must_use]
    pub fn may_modify<T: PartialEq>(self, actor: T, owner: T) -> bool {
        actor == owner || self.can_moderate()
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_string()))
    }
}
