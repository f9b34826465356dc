//! Lesson repository for lessons and their categories.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};

use campus_shared::types::{CategoryId, LessonId};

use crate::entities::{lesson_categories, lessons};

/// Error types for lesson operations.
#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    /// Category name already taken.
    #[error("A category named '{0}' already exists")]
    DuplicateCategoryName(String),

    /// Category not found.
    #[error("Category not found: {0}")]
    CategoryNotFound(CategoryId),

    /// Category still holds lessons.
    #[error("Category {0} still has lessons")]
    CategoryNotEmpty(CategoryId),

    /// Lesson not found.
    #[error("Lesson not found: {0}")]
    LessonNotFound(LessonId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating a lesson.
#[derive(Debug, Clone)]
pub struct CreateLessonInput {
    /// Lesson title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
    /// Whether the lesson file is a recording.
    pub is_audio: bool,
    /// Category the lesson is filed under.
    pub category_id: CategoryId,
}

/// Input for updating a lesson.
#[derive(Debug, Clone, Default)]
pub struct UpdateLessonInput {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub category_id: Option<CategoryId>,
    /// Whether the current file is a recording.
    pub is_audio: Option<bool>,
}

/// Lesson repository.
#[derive(Debug, Clone)]
pub struct LessonRepository {
    db: DatabaseConnection,
}

impl LessonRepository {
    /// Creates a new lesson repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Categories
    // ========================================================================

    /// Lists categories by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories(&self) -> Result<Vec<lesson_categories::Model>, LessonError> {
        let categories = lesson_categories::Entity::find()
            .order_by_asc(lesson_categories::Column::Name)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// Lists categories by name, each with its lessons oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_categories_with_lessons(
        &self,
    ) -> Result<Vec<(lesson_categories::Model, Vec<lessons::Model>)>, LessonError> {
        let categories = lesson_categories::Entity::find()
            .order_by_asc(lesson_categories::Column::Name)
            .find_with_related(lessons::Entity)
            .order_by_asc(lessons::Column::CreatedAt)
            .order_by_asc(lessons::Column::Id)
            .all(&self.db)
            .await?;
        Ok(categories)
    }

    /// Finds a category by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_category(
        &self,
        id: CategoryId,
    ) -> Result<Option<lesson_categories::Model>, LessonError> {
        let category = lesson_categories::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(category)
    }

    /// Finds a category by its exact name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_category_by_name(
        &self,
        name: &str,
    ) -> Result<Option<lesson_categories::Model>, LessonError> {
        let category = lesson_categories::Entity::find()
            .filter(lesson_categories::Column::Name.eq(name))
            .one(&self.db)
            .await?;
        Ok(category)
    }

    /// Creates a category.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateCategoryName` if the name is taken.
    pub async fn create_category(
        &self,
        name: String,
    ) -> Result<lesson_categories::Model, LessonError> {
        if self.find_category_by_name(&name).await?.is_some() {
            return Err(LessonError::DuplicateCategoryName(name));
        }

        let category = lesson_categories::ActiveModel {
            name: Set(name),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(category.insert(&self.db).await?)
    }

    /// Deletes an empty category.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Category not found
    /// - The category still has lessons
    pub async fn delete_category(&self, id: CategoryId) -> Result<(), LessonError> {
        if self.find_category(id).await?.is_none() {
            return Err(LessonError::CategoryNotFound(id));
        }

        let lessons = lessons::Entity::find()
            .filter(lessons::Column::CategoryId.eq(id.into_inner()))
            .count(&self.db)
            .await?;
        if lessons > 0 {
            return Err(LessonError::CategoryNotEmpty(id));
        }

        lesson_categories::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(())
    }

    // ========================================================================
    // Lessons
    // ========================================================================

    /// Lists the lessons of a category, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the category does not exist.
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<lessons::Model>, LessonError> {
        if self.find_category(category_id).await?.is_none() {
            return Err(LessonError::CategoryNotFound(category_id));
        }

        let lessons = lessons::Entity::find()
            .filter(lessons::Column::CategoryId.eq(category_id.into_inner()))
            .order_by_asc(lessons::Column::CreatedAt)
            .order_by_asc(lessons::Column::Id)
            .all(&self.db)
            .await?;
        Ok(lessons)
    }

    /// Finds a lesson by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: LessonId) -> Result<Option<lessons::Model>, LessonError> {
        let lesson = lessons::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(lesson)
    }

    /// Creates a lesson.
    ///
    /// # Errors
    ///
    /// Returns `CategoryNotFound` if the category does not exist.
    pub async fn create(&self, input: CreateLessonInput) -> Result<lessons::Model, LessonError> {
        if self.find_category(input.category_id).await?.is_none() {
            return Err(LessonError::CategoryNotFound(input.category_id));
        }

        let lesson = lessons::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            is_audio: Set(input.is_audio),
            category_id: Set(input.category_id.into_inner()),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(lesson.insert(&self.db).await?)
    }

    /// Updates a lesson.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Lesson not found
    /// - The new category does not exist
    pub async fn update(
        &self,
        id: LessonId,
        input: UpdateLessonInput,
    ) -> Result<lessons::Model, LessonError> {
        let lesson = self
            .find(id)
            .await?
            .ok_or(LessonError::LessonNotFound(id))?;

        if let Some(category_id) = input.category_id
            && self.find_category(category_id).await?.is_none()
        {
            return Err(LessonError::CategoryNotFound(category_id));
        }

        let mut active: lessons::ActiveModel = lesson.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }
        if let Some(category_id) = input.category_id {
            active.category_id = Set(category_id.into_inner());
        }
        if let Some(is_audio) = input.is_audio {
            active.is_audio = Set(is_audio);
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a lesson.
    ///
    /// Fails with a foreign key violation while its file is still recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: LessonId) -> Result<bool, LessonError> {
        let result = lessons::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
