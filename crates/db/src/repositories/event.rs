//! Event repository for calendar events.

use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, QueryOrder, Set};

use campus_shared::types::EventId;

use crate::entities::events;

/// Error types for event operations.
#[derive(Debug, thiserror::Error)]
pub enum EventError {
    /// Event not found.
    #[error("Event not found: {0}")]
    NotFound(EventId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Input for creating an event.
#[derive(Debug, Clone)]
pub struct CreateEventInput {
    /// Event title.
    pub title: String,
    /// Description.
    pub description: Option<String>,
}

/// Input for updating an event.
#[derive(Debug, Clone, Default)]
pub struct UpdateEventInput {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<String>,
}

/// Event repository.
#[derive(Debug, Clone)]
pub struct EventRepository {
    db: DatabaseConnection,
}

impl EventRepository {
    /// Creates a new event repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Lists events, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list(&self) -> Result<Vec<events::Model>, EventError> {
        let events = events::Entity::find()
            .order_by_desc(events::Column::CreatedAt)
            .order_by_desc(events::Column::Id)
            .all(&self.db)
            .await?;
        Ok(events)
    }

    /// Finds an event by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: EventId) -> Result<Option<events::Model>, EventError> {
        let event = events::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(event)
    }

    /// Creates an event.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, input: CreateEventInput) -> Result<events::Model, EventError> {
        let event = events::ActiveModel {
            title: Set(input.title),
            description: Set(input.description),
            created_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(event.insert(&self.db).await?)
    }

    /// Updates an event.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the event does not exist.
    pub async fn update(
        &self,
        id: EventId,
        input: UpdateEventInput,
    ) -> Result<events::Model, EventError> {
        let event = self.find(id).await?.ok_or(EventError::NotFound(id))?;

        let mut active: events::ActiveModel = event.into();
        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(Some(description));
        }

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an event.
    ///
    /// Fails with a foreign key violation while images still reference it.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: EventId) -> Result<bool, EventError> {
        let result = events::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }
}
