//! User repository for database operations.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use campus_core::auth::UserRole;
use campus_shared::types::UserId;

use crate::entities::users;

/// Error types for user operations.
#[derive(Debug, thiserror::Error)]
pub enum UserError {
    /// Email already registered.
    #[error("Email '{0}' is already registered")]
    DuplicateEmail(String),

    /// User not found.
    #[error("User not found: {0}")]
    NotFound(UserId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a user.
#[derive(Debug, Clone)]
pub struct CreateUserInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email, already normalized by the caller.
    pub email: String,
    /// Argon2id PHC hash.
    pub password_hash: String,
    /// Class cycle, required for students.
    pub class_cycle: Option<i32>,
    /// Platform role.
    pub role: UserRole,
}

/// Input for updating a user's own profile. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UpdateUserInput {
    /// New first name.
    pub first_name: Option<String>,
    /// New last name.
    pub last_name: Option<String>,
    /// New email.
    pub email: Option<String>,
    /// New class cycle.
    pub class_cycle: Option<i32>,
    /// New password hash.
    pub password_hash: Option<String>,
}

/// User repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    /// Creates a new user repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a user by email.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
    }

    /// Finds a user by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: UserId) -> Result<Option<users::Model>, DbErr> {
        users::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Lists all users by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<users::Model>, DbErr> {
        users::Entity::find()
            .order_by_asc(users::Column::Id)
            .all(&self.db)
            .await
    }

    /// Creates a new user.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The email is already registered
    /// - The database insert fails
    pub async fn create(&self, input: CreateUserInput) -> Result<users::Model, UserError> {
        if self.email_exists(&input.email).await? {
            return Err(UserError::DuplicateEmail(input.email));
        }

        let now = chrono::Utc::now().into();
        let user = users::ActiveModel {
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            password_hash: Set(input.password_hash),
            class_cycle: Set(input.class_cycle),
            role: Set(input.role.into()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(user.insert(&self.db).await?)
    }

    /// Updates profile fields of a user.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - User not found
    /// - The new email belongs to another user
    pub async fn update_profile(
        &self,
        id: UserId,
        input: UpdateUserInput,
    ) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        // If changing email, validate uniqueness
        if let Some(new_email) = &input.email
            && *new_email != user.email
            && self.email_exists(new_email).await?
        {
            return Err(UserError::DuplicateEmail(new_email.clone()));
        }

        let mut active: users::ActiveModel = user.into();

        if let Some(first_name) = input.first_name {
            active.first_name = Set(first_name);
        }
        if let Some(last_name) = input.last_name {
            active.last_name = Set(last_name);
        }
        if let Some(email) = input.email {
            active.email = Set(email);
        }
        if let Some(class_cycle) = input.class_cycle {
            active.class_cycle = Set(Some(class_cycle));
        }
        if let Some(password_hash) = input.password_hash {
            active.password_hash = Set(password_hash);
        }
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Assigns a role to a user.
    ///
    /// # Errors
    ///
    /// Returns an error if the user does not exist or the update fails.
    pub async fn set_role(&self, id: UserId, role: UserRole) -> Result<users::Model, UserError> {
        let user = self.find_by_id(id).await?.ok_or(UserError::NotFound(id))?;

        let mut active: users::ActiveModel = user.into();
        active.role = Set(role.into());
        active.updated_at = Set(chrono::Utc::now().into());

        Ok(active.update(&self.db).await?)
    }

    /// Checks if an email is already registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn email_exists(&self, email: &str) -> Result<bool, DbErr> {
        let count = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .count(&self.db)
            .await?;

        Ok(count > 0)
    }
}

/// Domain role of a stored user.
#[must_use]
pub fn role_of(user: &users::Model) -> UserRole {
    user.role.into()
}
