//! `SeaORM` active enums mapped to PostgreSQL enum types.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `user_role` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
pub enum UserRole {
    /// Guest account.
    #[sea_orm(string_value = "guest")]
    Guest,
    /// Student account.
    #[sea_orm(string_value = "student")]
    Student,
    /// Staff account.
    #[sea_orm(string_value = "staff")]
    Staff,
    /// Administrator.
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl From<campus_core::auth::UserRole> for UserRole {
    fn from(role: campus_core::auth::UserRole) -> Self {
        use campus_core::auth::UserRole as Domain;
        match role {
            Domain::Guest => Self::Guest,
            Domain::Student => Self::Student,
            Domain::Staff => Self::Staff,
            Domain::Admin => Self::Admin,
        }
    }
}

impl From<UserRole> for campus_core::auth::UserRole {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Guest => Self::Guest,
            UserRole::Student => Self::Student,
            UserRole::Staff => Self::Staff,
            UserRole::Admin => Self::Admin,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::ActiveEnum;

    #[test]
    fn test_role_mapping_roundtrip() {
        for role in campus_core::auth::UserRole::ALL {
            let db: UserRole = role.into();
            assert_eq!(db.to_value(), role.as_str());
            assert_eq!(campus_core::auth::UserRole::from(db), role);
        }
    }
}
