//! Question repository for the Q&A board.
//!
//! A question's `is_answered` flag tracks whether it has any answers. Answer
//! inserts and deletes update it in the same transaction.

use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

use campus_shared::types::{AnswerId, QuestionId, UserId};

use crate::entities::{answers, questions};

/// Error types for Q&A operations.
#[derive(Debug, thiserror::Error)]
pub enum QuestionError {
    /// Question not found.
    #[error("Question not found: {0}")]
    QuestionNotFound(QuestionId),

    /// Answer not found.
    #[error("Answer not found: {0}")]
    AnswerNotFound(AnswerId),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

/// Question repository.
#[derive(Debug, Clone)]
pub struct QuestionRepository {
    db: DatabaseConnection,
}

impl QuestionRepository {
    /// Creates a new question repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    // ========================================================================
    // Questions
    // ========================================================================

    /// Lists questions without answers, oldest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_unanswered(&self) -> Result<Vec<questions::Model>, QuestionError> {
        let questions = questions::Entity::find()
            .filter(questions::Column::IsAnswered.eq(false))
            .order_by_asc(questions::Column::AskedAt)
            .order_by_asc(questions::Column::Id)
            .all(&self.db)
            .await?;
        Ok(questions)
    }

    /// Lists the questions a user asked, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_asker(
        &self,
        asker_id: UserId,
    ) -> Result<Vec<questions::Model>, QuestionError> {
        let questions = questions::Entity::find()
            .filter(questions::Column::AskerId.eq(asker_id.into_inner()))
            .order_by_desc(questions::Column::AskedAt)
            .order_by_desc(questions::Column::Id)
            .all(&self.db)
            .await?;
        Ok(questions)
    }

    /// Finds a question by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find(&self, id: QuestionId) -> Result<Option<questions::Model>, QuestionError> {
        let question = questions::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(question)
    }

    /// Creates an unanswered question.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(
        &self,
        asker_id: UserId,
        question: String,
    ) -> Result<questions::Model, QuestionError> {
        let question = questions::ActiveModel {
            question: Set(question),
            asker_id: Set(asker_id.into_inner()),
            is_answered: Set(false),
            asked_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        Ok(question.insert(&self.db).await?)
    }

    /// Replaces the text of a question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotFound` if the question does not exist.
    pub async fn update(
        &self,
        id: QuestionId,
        question: String,
    ) -> Result<questions::Model, QuestionError> {
        let existing = self
            .find(id)
            .await?
            .ok_or(QuestionError::QuestionNotFound(id))?;

        let mut active: questions::ActiveModel = existing.into();
        active.question = Set(question);

        Ok(active.update(&self.db).await?)
    }

    /// Deletes a question and its answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub async fn delete(&self, id: QuestionId) -> Result<bool, QuestionError> {
        let result = questions::Entity::delete_by_id(id.into_inner())
            .exec(&self.db)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Answers
    // ========================================================================

    /// Lists the answers to a question, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotFound` if the question does not exist.
    pub async fn list_answers(
        &self,
        question_id: QuestionId,
    ) -> Result<Vec<answers::Model>, QuestionError> {
        if self.find(question_id).await?.is_none() {
            return Err(QuestionError::QuestionNotFound(question_id));
        }

        let answers = answers::Entity::find()
            .filter(answers::Column::QuestionId.eq(question_id.into_inner()))
            .order_by_asc(answers::Column::AnsweredAt)
            .order_by_asc(answers::Column::Id)
            .all(&self.db)
            .await?;
        Ok(answers)
    }

    /// Lists the answers a user wrote, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_by_answerer(
        &self,
        answerer_id: UserId,
    ) -> Result<Vec<answers::Model>, QuestionError> {
        let answers = answers::Entity::find()
            .filter(answers::Column::AnswererId.eq(answerer_id.into_inner()))
            .order_by_desc(answers::Column::AnsweredAt)
            .order_by_desc(answers::Column::Id)
            .all(&self.db)
            .await?;
        Ok(answers)
    }

    /// Finds an answer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_answer(&self, id: AnswerId) -> Result<Option<answers::Model>, QuestionError> {
        let answer = answers::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;
        Ok(answer)
    }

    /// Answers a question and marks it answered.
    ///
    /// # Errors
    ///
    /// Returns `QuestionNotFound` if the question does not exist.
    pub async fn create_answer(
        &self,
        question_id: QuestionId,
        answerer_id: UserId,
        answer: String,
    ) -> Result<answers::Model, QuestionError> {
        let txn = self.db.begin().await?;

        let question = questions::Entity::find_by_id(question_id.into_inner())
            .one(&txn)
            .await?
            .ok_or(QuestionError::QuestionNotFound(question_id))?;

        let answer = answers::ActiveModel {
            answer: Set(answer),
            answerer_id: Set(answerer_id.into_inner()),
            question_id: Set(question_id.into_inner()),
            answered_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        if !question.is_answered {
            set_answered(&txn, question, true).await?;
        }

        txn.commit().await?;
        Ok(answer)
    }

    /// Replaces the text of an answer.
    ///
    /// # Errors
    ///
    /// Returns `AnswerNotFound` if the answer does not exist.
    pub async fn update_answer(
        &self,
        id: AnswerId,
        answer: String,
    ) -> Result<answers::Model, QuestionError> {
        let existing = self
            .find_answer(id)
            .await?
            .ok_or(QuestionError::AnswerNotFound(id))?;

        let mut active: answers::ActiveModel = existing.into();
        active.answer = Set(answer);

        Ok(active.update(&self.db).await?)
    }

    /// Deletes an answer. The question goes back to unanswered when its last
    /// answer is removed.
    ///
    /// # Errors
    ///
    /// Returns `AnswerNotFound` if the answer does not exist.
    pub async fn delete_answer(&self, id: AnswerId) -> Result<(), QuestionError> {
        let txn = self.db.begin().await?;

        let answer = answers::Entity::find_by_id(id.into_inner())
            .one(&txn)
            .await?
            .ok_or(QuestionError::AnswerNotFound(id))?;

        answers::Entity::delete_by_id(answer.id).exec(&txn).await?;

        let remaining = answers::Entity::find()
            .filter(answers::Column::QuestionId.eq(answer.question_id))
            .count(&txn)
            .await?;

        if remaining == 0
            && let Some(question) = questions::Entity::find_by_id(answer.question_id)
                .one(&txn)
                .await?
        {
            set_answered(&txn, question, false).await?;
        }

        txn.commit().await?;
        Ok(())
    }
}

async fn set_answered<C: ConnectionTrait>(
    conn: &C,
    question: questions::Model,
    answered: bool,
) -> Result<(), DbErr> {
    let mut active: questions::ActiveModel = question.into();
    active.is_answered = Set(answered);
    active.update(conn).await?;
    Ok(())
}
