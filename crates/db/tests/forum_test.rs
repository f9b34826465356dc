//! Integration tests for Forum repository.

mod common;

use campus_core::auth::UserRole;
use campus_db::ForumRepository;
use campus_db::repositories::{
    CreateClusterInput, CreatePostInput, ForumError, UpdateClusterInput, UpdatePostInput,
};
use campus_shared::types::{ClusterId, PostId, ReplyId, UserId};

fn post_input(author: i64, cluster_id: Option<ClusterId>) -> CreatePostInput {
    CreatePostInput {
        title: common::unique("Post"),
        content: "What did everyone get for question 3?".to_string(),
        author_id: UserId::new(author),
        cluster_id,
    }
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_post_lifecycle() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Student).await;

    let post = repo
        .create_post(post_input(author.id, None))
        .await
        .expect("Failed to create post");
    let id = PostId::new(post.id);

    let updated = repo
        .update_post(
            id,
            UpdatePostInput {
                content: Some("Edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Update should succeed");
    assert_eq!(updated.title, post.title);
    assert_eq!(updated.content, "Edited");

    assert!(repo.delete_post(id).await.expect("Delete should succeed"));
    assert!(repo.find_post(id).await.expect("Query should succeed").is_none());
    assert!(!repo.delete_post(id).await.expect("Delete should succeed"));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_post_duplicate_title() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Guest).await;

    let first = repo
        .create_post(post_input(author.id, None))
        .await
        .expect("Failed to create post");

    let mut duplicate = post_input(author.id, None);
    duplicate.title = first.title.clone();
    let err = repo.create_post(duplicate).await.unwrap_err();
    assert!(matches!(err, ForumError::DuplicateTitle(_)));

    let second = repo
        .create_post(post_input(author.id, None))
        .await
        .expect("Failed to create post");
    let err = repo
        .update_post(
            PostId::new(second.id),
            UpdatePostInput {
                title: Some(first.title),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::DuplicateTitle(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_post_unknown_cluster() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Guest).await;

    let err = repo
        .create_post(post_input(author.id, Some(ClusterId::new(i64::MAX))))
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::ClusterNotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_replies_cascade_with_post() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Student).await;
    let post = repo
        .create_post(post_input(author.id, None))
        .await
        .expect("Failed to create post");
    let post_id = PostId::new(post.id);

    let first = repo
        .create_reply(post_id, UserId::new(author.id), "First".to_string())
        .await
        .expect("Failed to create reply");
    let second = repo
        .create_reply(post_id, UserId::new(author.id), "Second".to_string())
        .await
        .expect("Failed to create reply");

    let replies = repo.list_replies(post_id).await.expect("Query should succeed");
    assert_eq!(
        replies.iter().map(|r| r.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    let mut ids = repo.reply_ids(post_id).await.expect("Query should succeed");
    ids.sort();
    assert_eq!(ids, vec![ReplyId::new(first.id), ReplyId::new(second.id)]);

    repo.delete_post(post_id).await.expect("Delete should succeed");
    assert!(
        repo.find_reply(ReplyId::new(first.id))
            .await
            .expect("Query should succeed")
            .is_none()
    );
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_reply_on_missing_post() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Guest).await;

    let err = repo
        .create_reply(PostId::new(i64::MAX), UserId::new(author.id), "x".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, ForumError::PostNotFound(_)));

    let err = repo.list_replies(PostId::new(i64::MAX)).await.unwrap_err();
    assert!(matches!(err, ForumError::PostNotFound(_)));
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cluster_delete_unlinks_posts() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Staff).await;

    let cluster = repo
        .create_cluster(CreateClusterInput {
            name: common::unique("Algorithms"),
            description: Some("Course forum".to_string()),
            author_id: UserId::new(author.id),
        })
        .await
        .expect("Failed to create cluster");
    let cluster_id = ClusterId::new(cluster.id);

    let post = repo
        .create_post(post_input(author.id, Some(cluster_id)))
        .await
        .expect("Failed to create post");
    assert_eq!(post.cluster_id, Some(cluster.id));

    let renamed = repo
        .update_cluster(
            cluster_id,
            UpdateClusterInput {
                description: Some("Renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("Update should succeed");
    assert_eq!(renamed.description.as_deref(), Some("Renamed"));

    assert!(repo.delete_cluster(cluster_id).await.expect("Delete should succeed"));

    let post = repo
        .find_post(PostId::new(post.id))
        .await
        .expect("Query should succeed")
        .expect("Post should survive");
    assert_eq!(post.cluster_id, None);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn test_cluster_duplicate_name() {
    let db = common::connect().await;
    let repo = ForumRepository::new(db.clone());
    let author = common::create_user(&db, UserRole::Guest).await;
    let name = common::unique("Physics");

    let input = CreateClusterInput {
        name: name.clone(),
        description: None,
        author_id: UserId::new(author.id),
    };
    repo.create_cluster(input.clone())
        .await
        .expect("Failed to create cluster");

    let err = repo.create_cluster(input).await.unwrap_err();
    assert!(matches!(err, ForumError::DuplicateClusterName(n) if n == name));
}
