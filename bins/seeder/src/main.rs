//! Database seeder for Campus development and testing.
//!
//! Seeds a bootstrap admin account along with default forum clusters and lesson
//! categories so a fresh database is usable right away. Running it twice is harmless.
//!
//! Environment:
//! - `DATABASE_URL` (required)
//! - `SEED_ADMIN_EMAIL` (default `admin@campus.dev`)
//! - `SEED_ADMIN_PASSWORD` (default `campus-admin-dev`)
//!
//! Usage: cargo run --bin seeder

use anyhow::Context;

use campus_core::auth::{UserRole, hash_password};
use campus_db::repositories::{CreateClusterInput, CreateUserInput, ForumError, LessonError};
use campus_db::{ForumRepository, LessonRepository, UserRepository};
use campus_shared::types::UserId;

const DEFAULT_ADMIN_EMAIL: &str = "admin@campus.dev";
const DEFAULT_ADMIN_PASSWORD: &str = "campus-admin-dev";

const CLUSTERS: [(&str, &str); 3] = [
    ("General", "Anything that does not fit elsewhere"),
    ("Courses", "Questions about lectures and coursework"),
    ("Campus Life", "Clubs, housing and events"),
];

const LESSON_CATEGORIES: [&str; 2] = ["General", "Recorded Lectures"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let database_url =
        std::env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    println!("Connecting to database...");
    let db = campus_db::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    println!("Seeding admin user...");
    let admin_id = seed_admin(&UserRepository::new(db.clone())).await?;

    println!("Seeding forum clusters...");
    seed_clusters(&ForumRepository::new(db.clone()), admin_id).await?;

    println!("Seeding lesson categories...");
    seed_lesson_categories(&LessonRepository::new(db)).await?;

    println!("Seeding complete!");
    Ok(())
}

/// Creates the bootstrap admin unless the email is already registered.
async fn seed_admin(users: &UserRepository) -> anyhow::Result<UserId> {
    let email = std::env::var("SEED_ADMIN_EMAIL")
        .unwrap_or_else(|_| DEFAULT_ADMIN_EMAIL.to_string())
        .trim()
        .to_ascii_lowercase();

    if let Some(existing) = users.find_by_email(&email).await? {
        println!("  Admin {email} already exists, skipping...");
        return Ok(UserId::new(existing.id));
    }

    let password = std::env::var("SEED_ADMIN_PASSWORD")
        .unwrap_or_else(|_| DEFAULT_ADMIN_PASSWORD.to_string());

    let user = users
        .create(CreateUserInput {
            first_name: "Campus".to_string(),
            last_name: "Admin".to_string(),
            email: email.clone(),
            password_hash: hash_password(&password)?,
            class_cycle: None,
            role: UserRole::Admin,
        })
        .await?;

    println!("  Created admin user: {email}");
    Ok(UserId::new(user.id))
}

/// Creates the default clusters, skipping names that already exist.
async fn seed_clusters(forum: &ForumRepository, author_id: UserId) -> anyhow::Result<()> {
    let mut inserted = 0;

    for (name, description) in CLUSTERS {
        let result = forum
            .create_cluster(CreateClusterInput {
                name: name.to_string(),
                description: Some(description.to_string()),
                author_id,
            })
            .await;

        match result {
            Ok(_) => inserted += 1,
            Err(ForumError::DuplicateClusterName(_)) => {}
            Err(e) => return Err(e).context(format!("Failed to insert cluster {name}")),
        }
    }

    println!("  Inserted {inserted} clusters");
    Ok(())
}

async fn seed_lesson_categories(lessons: &LessonRepository) -> anyhow::Result<()> {
    let mut inserted = 0;

    for name in LESSON_CATEGORIES {
        match lessons.create_category(name.to_string()).await {
            Ok(_) => inserted += 1,
            Err(LessonError::DuplicateCategoryName(_)) => {}
            Err(e) => return Err(e).context(format!("Failed to insert lesson category {name}")),
        }
    }

    println!("  Inserted {inserted} lesson categories");
    Ok(())
}
