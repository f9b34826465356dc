//! Integration tests for User repository.

mod common;

use campus_core::auth::UserRole;
use campus_db::UserRepository;
use campus_db::repositories::{CreateUserInput, UpdateUserInput, UserError, role_of};
use campus_shared::types::UserId;

fn input(email: &str) -> CreateUserInput {
    CreateUserInput {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$test_hash".to_string(),
        class_cycle: Some(2025),
        role: UserRole::Student,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_create_and_find() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let email = format!("{}@example.com", common::unique("create"));

    let user = repo.create(input(&email)).await.expect("Failed to create user");

    assert_eq!(user.email, email);
    assert_eq!(user.first_name, "Ada");
    assert_eq!(user.class_cycle, Some(2025));
    assert_eq!(role_of(&user), UserRole::Student);

    let by_id = repo
        .find_by_id(UserId::new(user.id))
        .await
        .expect("Query should succeed")
        .expect("User should exist");
    assert_eq!(by_id.email, email);

    let by_email = repo
        .find_by_email(&email)
        .await
        .expect("Query should succeed")
        .expect("User should exist");
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_duplicate_email() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let email = format!("{}@example.com", common::unique("dup"));

    repo.create(input(&email)).await.expect("Failed to create user");
    let err = repo.create(input(&email)).await.unwrap_err();

    assert!(matches!(err, UserError::DuplicateEmail(e) if e == email));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_not_found() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());

    let found = repo
        .find_by_id(UserId::new(i64::MAX))
        .await
        .expect("Query should succeed");
    assert!(found.is_none());

    let missing = repo
        .find_by_email("nobody-here@example.invalid")
        .await
        .expect("Query should succeed");
    assert!(missing.is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_update_profile() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::create_user(&db, UserRole::Guest).await;
    let new_email = format!("{}@example.com", common::unique("renamed"));

    let updated = repo
        .update_profile(
            UserId::new(user.id),
            UpdateUserInput {
                first_name: Some("Grace".to_string()),
                email: Some(new_email.clone()),
                ..Default::default()
            },
        )
        .await
        .expect("Update should succeed");

    assert_eq!(updated.first_name, "Grace");
    assert_eq!(updated.last_name, user.last_name);
    assert_eq!(updated.email, new_email);
    assert!(updated.updated_at >= user.updated_at);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_update_to_taken_email() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let first = common::create_user(&db, UserRole::Guest).await;
    let second = common::create_user(&db, UserRole::Guest).await;

    let err = repo
        .update_profile(
            UserId::new(second.id),
            UpdateUserInput {
                email: Some(first.email.clone()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, UserError::DuplicateEmail(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_set_role() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let user = common::create_user(&db, UserRole::Guest).await;

    let updated = repo
        .set_role(UserId::new(user.id), UserRole::Staff)
        .await
        .expect("Role change should succeed");
    assert_eq!(role_of(&updated), UserRole::Staff);

    let err = repo
        .set_role(UserId::new(i64::MAX), UserRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, UserError::NotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_user_email_exists() {
    let db = common::connect().await;
    let repo = UserRepository::new(db.clone());
    let email = format!("{}@example.com", common::unique("exists"));

    assert!(!repo.email_exists(&email).await.expect("Query should succeed"));
    repo.create(input(&email)).await.expect("Failed to create user");
    assert!(repo.email_exists(&email).await.expect("Query should succeed"));
}
