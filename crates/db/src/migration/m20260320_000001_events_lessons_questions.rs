//! Calendar events, recorded lessons and the Q&A board.
//!
//! Adds the `events`, `lesson_categories`, `lessons`, `questions` and
//! `answers` tables, and lets attachments hang off events and lessons.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: EVENTS
        // ============================================================
        db.execute_unprepared(EVENTS_SQL).await?;

        // ============================================================
        // PART 2: LESSONS
        // ============================================================
        db.execute_unprepared(LESSON_CATEGORIES_SQL).await?;
        db.execute_unprepared(LESSONS_SQL).await?;

        // ============================================================
        // PART 3: Q&A
        // ============================================================
        db.execute_unprepared(QUESTIONS_SQL).await?;
        db.execute_unprepared(ANSWERS_SQL).await?;

        // ============================================================
        // PART 4: ATTACHMENT PARENTS
        // ============================================================
        db.execute_unprepared(ATTACHMENT_PARENTS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DOWN_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const EVENTS_SQL: &str = r"
CREATE TABLE events (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(100) NOT NULL,
    description TEXT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_events_created ON events(created_at DESC);
";

const LESSON_CATEGORIES_SQL: &str = r"
CREATE TABLE lesson_categories (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(50) NOT NULL UNIQUE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const LESSONS_SQL: &str = r"
CREATE TABLE lessons (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL,
    description TEXT,
    is_audio BOOLEAN NOT NULL DEFAULT false,
    category_id BIGINT NOT NULL REFERENCES lesson_categories(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_lessons_category ON lessons(category_id, created_at);
";

const QUESTIONS_SQL: &str = r"
CREATE TABLE questions (
    id BIGSERIAL PRIMARY KEY,
    question TEXT NOT NULL,
    asker_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    is_answered BOOLEAN NOT NULL DEFAULT false,
    asked_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_questions_asker ON questions(asker_id);
CREATE INDEX idx_questions_unanswered ON questions(asked_at) WHERE NOT is_answered;
";

const ANSWERS_SQL: &str = r"
CREATE TABLE answers (
    id BIGSERIAL PRIMARY KEY,
    answer TEXT NOT NULL,
    answerer_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    question_id BIGINT NOT NULL REFERENCES questions(id) ON DELETE CASCADE,
    answered_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_answers_question ON answers(question_id, answered_at);
CREATE INDEX idx_answers_answerer ON answers(answerer_id);
";

const ATTACHMENT_PARENTS_SQL: &str = r"
ALTER TABLE attachments
    ADD COLUMN event_id BIGINT REFERENCES events(id) ON DELETE RESTRICT;
ALTER TABLE attachments
    ADD COLUMN lesson_id BIGINT REFERENCES lessons(id) ON DELETE RESTRICT;

ALTER TABLE attachments DROP CONSTRAINT chk_attachment_single_parent;
ALTER TABLE attachments ADD CONSTRAINT chk_attachment_single_parent
    CHECK (num_nonnulls(post_id, reply_id, event_id, lesson_id) = 1);

CREATE INDEX idx_attachments_event ON attachments(event_id, id) WHERE event_id IS NOT NULL;
CREATE INDEX idx_attachments_lesson ON attachments(lesson_id, id) WHERE lesson_id IS NOT NULL;
";

// Event and lesson attachment rows cannot satisfy the old constraint, so they
// are dropped along with their tables. Their blobs are left in storage.
const DOWN_SQL: &str = r"
DELETE FROM attachments WHERE event_id IS NOT NULL OR lesson_id IS NOT NULL;

ALTER TABLE attachments DROP CONSTRAINT chk_attachment_single_parent;
ALTER TABLE attachments ADD CONSTRAINT chk_attachment_single_parent
    CHECK ((post_id IS NULL) <> (reply_id IS NULL));

DROP INDEX IF EXISTS idx_attachments_event;
DROP INDEX IF EXISTS idx_attachments_lesson;
ALTER TABLE attachments DROP COLUMN IF EXISTS event_id;
ALTER TABLE attachments DROP COLUMN IF EXISTS lesson_id;

DROP TABLE IF EXISTS answers CASCADE;
DROP TABLE IF EXISTS questions CASCADE;
DROP TABLE IF EXISTS lessons CASCADE;
DROP TABLE IF EXISTS lesson_categories CASCADE;
DROP TABLE IF EXISTS events CASCADE;
";
