//! Initial database migration.
//!
//! Creates the user, forum and attachment tables together with the
//! `user_role` enum and the `updated_at` trigger.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();

        // ============================================================
        // PART 1: ENUMS
        // ============================================================
        db.execute_unprepared(ENUMS_SQL).await?;

        // ============================================================
        // PART 2: USERS
        // ============================================================
        db.execute_unprepared(USERS_SQL).await?;

        // ============================================================
        // PART 3: FORUM
        // ============================================================
        db.execute_unprepared(FORUM_CLUSTERS_SQL).await?;
        db.execute_unprepared(FORUM_POSTS_SQL).await?;
        db.execute_unprepared(FORUM_REPLIES_SQL).await?;

        // ============================================================
        // PART 4: ATTACHMENTS
        // ============================================================
        db.execute_unprepared(ATTACHMENTS_SQL).await?;

        // ============================================================
        // PART 5: TRIGGERS
        // ============================================================
        db.execute_unprepared(TRIGGERS_SQL).await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let db = manager.get_connection();
        db.execute_unprepared(DROP_ALL_SQL).await?;
        Ok(())
    }
}

// ============================================================
// SQL CONSTANTS
// ============================================================

const ENUMS_SQL: &str = r"
CREATE TYPE user_role AS ENUM ('guest', 'student', 'staff', 'admin');
";

const USERS_SQL: &str = r"
CREATE TABLE users (
    id BIGSERIAL PRIMARY KEY,
    first_name VARCHAR(100) NOT NULL,
    last_name VARCHAR(100) NOT NULL,
    email VARCHAR(255) NOT NULL UNIQUE,
    password_hash VARCHAR(255) NOT NULL,
    class_cycle INTEGER,
    role user_role NOT NULL DEFAULT 'guest',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_student_class_cycle CHECK (role <> 'student' OR class_cycle IS NOT NULL)
);

CREATE INDEX idx_users_role ON users(role);
";

const FORUM_CLUSTERS_SQL: &str = r"
CREATE TABLE forum_clusters (
    id BIGSERIAL PRIMARY KEY,
    name VARCHAR(100) NOT NULL UNIQUE,
    description TEXT,
    author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
";

const FORUM_POSTS_SQL: &str = r"
CREATE TABLE forum_posts (
    id BIGSERIAL PRIMARY KEY,
    title VARCHAR(255) NOT NULL UNIQUE,
    content TEXT NOT NULL,
    author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    cluster_id BIGINT REFERENCES forum_clusters(id) ON DELETE SET NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_forum_posts_author ON forum_posts(author_id);
CREATE INDEX idx_forum_posts_cluster ON forum_posts(cluster_id) WHERE cluster_id IS NOT NULL;
CREATE INDEX idx_forum_posts_created ON forum_posts(created_at DESC);
";

const FORUM_REPLIES_SQL: &str = r"
CREATE TABLE forum_replies (
    id BIGSERIAL PRIMARY KEY,
    content TEXT NOT NULL,
    author_id BIGINT NOT NULL REFERENCES users(id) ON DELETE RESTRICT,
    post_id BIGINT NOT NULL REFERENCES forum_posts(id) ON DELETE CASCADE,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX idx_forum_replies_post ON forum_replies(post_id, created_at);
";

const ATTACHMENTS_SQL: &str = r"
CREATE TABLE attachments (
    id BIGSERIAL PRIMARY KEY,
    post_id BIGINT REFERENCES forum_posts(id) ON DELETE RESTRICT,
    reply_id BIGINT REFERENCES forum_replies(id) ON DELETE RESTRICT,
    file_name VARCHAR(255) NOT NULL,
    storage_key VARCHAR(1024) NOT NULL UNIQUE,
    content_type VARCHAR(255) NOT NULL,
    byte_size BIGINT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now(),

    CONSTRAINT chk_attachment_single_parent CHECK ((post_id IS NULL) <> (reply_id IS NULL)),
    CONSTRAINT chk_attachment_size_positive CHECK (byte_size > 0)
);

CREATE INDEX idx_attachments_post ON attachments(post_id, id) WHERE post_id IS NOT NULL;
CREATE INDEX idx_attachments_reply ON attachments(reply_id, id) WHERE reply_id IS NOT NULL;
";

const TRIGGERS_SQL: &str = r"
CREATE OR REPLACE FUNCTION set_updated_at()
RETURNS TRIGGER AS $$
BEGIN
    NEW.updated_at = now();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated_at
    BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION set_updated_at();
";

const DROP_ALL_SQL: &str = r"
DROP TABLE IF EXISTS attachments CASCADE;
DROP TABLE IF EXISTS forum_replies CASCADE;
DROP TABLE IF EXISTS forum_posts CASCADE;
DROP TABLE IF EXISTS forum_clusters CASCADE;
DROP TABLE IF EXISTS users CASCADE;
DROP FUNCTION IF EXISTS set_updated_at() CASCADE;
DROP TYPE IF EXISTS user_role CASCADE;
";
