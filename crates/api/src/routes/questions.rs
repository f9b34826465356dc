//! Q&A board routes.
//!
//! Anyone may read. Any signed-in role except guest may ask, and askers (or
//! admins) may edit or withdraw their questions. Answers are written, edited
//! and removed by staff and admins.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post, put},
};
use serde::{Deserialize, Serialize};
use tracing::info;

use campus_db::QuestionRepository;
use campus_db::entities::{answers, questions};
use campus_shared::types::{AnswerId, QuestionId, UserId};

use super::required_text;
use crate::{AppState, error::ApiError, middleware::AuthUser};

/// Routes anyone may call.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/questions/unanswered", get(list_unanswered))
        .route("/questions/{id}", get(get_question))
        .route("/users/{id}/questions", get(list_user_questions))
        .route("/users/{id}/answers", get(list_user_answers))
}

/// Routes that require an authenticated caller.
pub fn protected_routes() -> Router<AppState> {
    Router::new()
        .route("/questions", post(create_question))
        .route(
            "/questions/{id}",
            put(update_question).delete(delete_question),
        )
        .route("/questions/{id}/answers", post(create_answer))
        .route("/answers/{id}", put(update_answer).delete(delete_answer))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request body for asking or editing a question.
#[derive(Debug, Deserialize)]
pub struct QuestionRequest {
    /// The question.
    pub question: String,
}

/// Request body for writing or editing an answer.
#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    /// The answer.
    pub answer: String,
}

/// A question on the board.
#[derive(Debug, Serialize)]
pub struct QuestionResponse {
    /// Question ID.
    pub id: i64,
    /// The question.
    pub question: String,
    /// Who asked.
    pub asker_id: i64,
    /// Whether it has at least one answer.
    pub is_answered: bool,
    /// Asked at timestamp (ISO 8601).
    pub asked_at: String,
}

impl From<questions::Model> for QuestionResponse {
    fn from(question: questions::Model) -> Self {
        Self {
            id: question.id,
            question: question.question,
            asker_id: question.asker_id,
            is_answered: question.is_answered,
            asked_at: question.asked_at.to_rfc3339(),
        }
    }
}

/// An answer to a question.
#[derive(Debug, Serialize)]
pub struct AnswerResponse {
    /// Answer ID.
    pub id: i64,
    /// The answer.
    pub answer: String,
    /// Who answered.
    pub answerer_id: i64,
    /// Question answered.
    pub question_id: i64,
    /// Answered at timestamp (ISO 8601).
    pub answered_at: String,
}

impl From<answers::Model> for AnswerResponse {
    fn from(answer: answers::Model) -> Self {
        Self {
            id: answer.id,
            answer: answer.answer,
            answerer_id: answer.answerer_id,
            question_id: answer.question_id,
            answered_at: answer.answered_at.to_rfc3339(),
        }
    }
}

/// A question with its answers.
#[derive(Debug, Serialize)]
pub struct QuestionDetailResponse {
    /// The question.
    #[serde(flatten)]
    pub question: QuestionResponse,
    /// Answers, oldest first.
    pub answers: Vec<AnswerResponse>,
}

// ============================================================================
// Helper Functions
// ============================================================================

fn require_asker_role(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_ask_questions() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Guests may not ask questions"))
    }
}

fn require_answerer_role(auth: &AuthUser) -> Result<(), ApiError> {
    if auth.role().can_answer_questions() {
        Ok(())
    } else {
        Err(ApiError::forbidden("Only staff and admins may answer questions"))
    }
}

async fn load_question(
    repo: &QuestionRepository,
    id: QuestionId,
) -> Result<questions::Model, ApiError> {
    repo.find(id).await?.ok_or_else(|| {
        ApiError::not_found("question_not_found", format!("Question not found: {id}"))
    })
}

// ============================================================================
// Question Handlers
// ============================================================================

/// GET `/questions/unanswered`
async fn list_unanswered(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let questions = QuestionRepository::new((*state.db).clone())
        .list_unanswered()
        .await?;

    Ok(Json(
        questions
            .into_iter()
            .map(QuestionResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// GET `/questions/{id}`
/// The question with its answers.
async fn get_question(
    State(state): State<AppState>,
    Path(id): Path<QuestionId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = QuestionRepository::new((*state.db).clone());
    let question = load_question(&repo, id).await?;
    let answers = repo.list_answers(id).await?;

    Ok(Json(QuestionDetailResponse {
        question: question.into(),
        answers: answers.into_iter().map(AnswerResponse::from).collect(),
    }))
}

/// GET `/users/{id}/questions`
async fn list_user_questions(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let questions = QuestionRepository::new((*state.db).clone())
        .list_by_asker(id)
        .await?;

    Ok(Json(
        questions
            .into_iter()
            .map(QuestionResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST `/questions`
/// Any role except guest.
async fn create_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_asker_role(&auth)?;
    let text = required_text("question", &payload.question)?;

    let question = QuestionRepository::new((*state.db).clone())
        .create(auth.user_id(), text)
        .await?;

    info!(question_id = %question.id, asker_id = %auth.user_id(), "Question asked");

    Ok((StatusCode::CREATED, Json(QuestionResponse::from(question))))
}

/// PUT `/questions/{id}`
/// Asker or admin.
async fn update_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<QuestionId>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let text = required_text("question", &payload.question)?;

    let repo = QuestionRepository::new((*state.db).clone());
    let question = load_question(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(question.asker_id))?;

    let question = repo.update(id, text).await?;

    Ok(Json(QuestionResponse::from(question)))
}

/// DELETE `/questions/{id}`
/// Asker or admin. Answers go with it.
async fn delete_question(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<QuestionId>,
) -> Result<impl IntoResponse, ApiError> {
    let repo = QuestionRepository::new((*state.db).clone());
    let question = load_question(&repo, id).await?;
    auth.require_owner_or_admin(UserId::new(question.asker_id))?;

    if !repo.delete(id).await? {
        return Err(ApiError::not_found(
            "question_not_found",
            format!("Question not found: {id}"),
        ));
    }

    info!(question_id = %id, deleted_by = %auth.user_id(), "Question deleted");

    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Answer Handlers
// ============================================================================

/// GET `/users/{id}/answers`
async fn list_user_answers(
    State(state): State<AppState>,
    Path(id): Path<UserId>,
) -> Result<impl IntoResponse, ApiError> {
    let answers = QuestionRepository::new((*state.db).clone())
        .list_by_answerer(id)
        .await?;

    Ok(Json(
        answers
            .into_iter()
            .map(AnswerResponse::from)
            .collect::<Vec<_>>(),
    ))
}

/// POST `/questions/{id}/answers`
/// Staff or admin. Marks the question answered.
async fn create_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<QuestionId>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_answerer_role(&auth)?;
    let text = required_text("answer", &payload.answer)?;

    let answer = QuestionRepository::new((*state.db).clone())
        .create_answer(id, auth.user_id(), text)
        .await?;

    info!(
        answer_id = %answer.id,
        question_id = %id,
        answerer_id = %auth.user_id(),
        "Question answered"
    );

    Ok((StatusCode::CREATED, Json(AnswerResponse::from(answer))))
}

/// PUT `/answers/{id}`
/// Staff or admin.
async fn update_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<AnswerId>,
    Json(payload): Json<AnswerRequest>,
) -> Result<impl IntoResponse, ApiError> {
    require_answerer_role(&auth)?;
    let text = required_text("answer", &payload.answer)?;

    let answer = QuestionRepository::new((*state.db).clone())
        .update_answer(id, text)
        .await?;

    Ok(Json(AnswerResponse::from(answer)))
}

/// DELETE `/answers/{id}`
/// Staff or admin. The question becomes unanswered when its last answer goes.
async fn delete_answer(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<AnswerId>,
) -> Result<impl IntoResponse, ApiError> {
    require_answerer_role(&auth)?;

    QuestionRepository::new((*state.db).clone())
        .delete_answer(id)
        .await?;

    info!(answer_id = %id, deleted_by = %auth.user_id(), "Answer deleted");

    Ok(StatusCode::NO_CONTENT)
}
