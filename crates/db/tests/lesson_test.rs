//! Integration tests for Lesson repository.

mod common;

use campus_db::LessonRepository;
use campus_db::repositories::{CreateLessonInput, LessonError, UpdateLessonInput};
use campus_shared::types::{CategoryId, LessonId};

fn lesson_input(category_id: CategoryId, title: &str) -> CreateLessonInput {
    CreateLessonInput {
        title: title.to_string(),
        description: None,
        is_audio: false,
        category_id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_category_names_are_unique() {
    let db = common::connect().await;
    let repo = LessonRepository::new(db);
    let name = common::unique("Cat");

    repo.create_category(name.clone())
        .await
        .expect("Failed to create category");
    let result = repo.create_category(name).await;

    assert!(matches!(result, Err(LessonError::DuplicateCategoryName(_))));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_lessons_grouped_by_category() {
    let db = common::connect().await;
    let repo = LessonRepository::new(db);
    let category = repo
        .create_category(common::unique("Cat"))
        .await
        .expect("Failed to create category");
    let category_id = CategoryId::new(category.id);

    let first = repo
        .create(lesson_input(category_id, "Week 1"))
        .await
        .expect("Failed to create lesson");
    let second = repo
        .create(lesson_input(category_id, "Week 2"))
        .await
        .expect("Failed to create lesson");

    let listed = repo
        .list_by_category(category_id)
        .await
        .expect("List should succeed");
    assert_eq!(listed, vec![first.clone(), second.clone()]);

    let grouped = repo
        .list_categories_with_lessons()
        .await
        .expect("List should succeed");
    let (_, lessons) = grouped
        .into_iter()
        .find(|(c, _)| c.id == category.id)
        .expect("category listed");
    assert_eq!(lessons, vec![first.clone(), second.clone()]);

    // Non-empty categories cannot be deleted
    assert!(matches!(
        repo.delete_category(category_id).await,
        Err(LessonError::CategoryNotEmpty(_))
    ));

    repo.delete(LessonId::new(first.id)).await.expect("delete");
    repo.delete(LessonId::new(second.id)).await.expect("delete");
    repo.delete_category(category_id)
        .await
        .expect("Empty category should delete");
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_lesson_requires_existing_category() {
    let db = common::connect().await;
    let repo = LessonRepository::new(db);

    let result = repo
        .create(lesson_input(CategoryId::new(i64::MAX), "Orphan"))
        .await;
    assert!(matches!(result, Err(LessonError::CategoryNotFound(_))));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_update_lesson_moves_category() {
    let db = common::connect().await;
    let repo = LessonRepository::new(db);
    let from = repo
        .create_category(common::unique("From"))
        .await
        .expect("create category");
    let to = repo
        .create_category(common::unique("To"))
        .await
        .expect("create category");
    let lesson = repo
        .create(lesson_input(CategoryId::new(from.id), "Moving"))
        .await
        .expect("create lesson");

    let updated = repo
        .update(
            LessonId::new(lesson.id),
            UpdateLessonInput {
                category_id: Some(CategoryId::new(to.id)),
                is_audio: Some(true),
                ..Default::default()
            },
        )
        .await
        .expect("Update should succeed");

    assert_eq!(updated.category_id, to.id);
    assert!(updated.is_audio);
    assert_eq!(updated.title, "Moving");
}
