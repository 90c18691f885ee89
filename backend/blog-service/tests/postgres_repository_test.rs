//! Postgres repository tests
//!
//! Run against a scratch database:
//! `DATABASE_URL=postgres://... cargo test -p blog-service -- --ignored`

use blog_service::db::{PostFilter, Repositories};
use blog_service::models::{GroupForm, PostForm, UserId};
use db_pool::{create_pool, DbConfig};
use sqlx::PgPool;
use uuid::Uuid;

async fn create_test_pool() -> PgPool {
    let config = DbConfig::from_env("blog-service-test").expect("DATABASE_URL must be set");
    let pool = create_pool(config)
        .await
        .expect("Failed to create test pool");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");
    pool
}

fn user() -> UserId {
    UserId(Uuid::new_v4())
}

fn post_form(text: &str, group: Option<i64>) -> PostForm {
    PostForm {
        text: text.to_string(),
        group,
        image: None,
    }
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_follow_insert_is_idempotent() {
    let repos = Repositories::postgres(create_test_pool().await);
    let (reader, writer) = (user(), user());

    assert!(repos.follows.insert(reader, writer).await.unwrap().is_some());
    assert!(repos.follows.insert(reader, writer).await.unwrap().is_none());
    assert_eq!(repos.follows.list_for_user(reader).await.unwrap().len(), 1);

    assert!(repos.follows.delete(reader, writer).await.unwrap());
    assert!(!repos.follows.delete(reader, writer).await.unwrap());
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_self_follow_violates_constraint() {
    let repos = Repositories::postgres(create_test_pool().await);
    let me = user();

    assert!(repos.follows.insert(me, me).await.is_err());
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_posts_listed_newest_first() {
    let repos = Repositories::postgres(create_test_pool().await);
    let author = user();
    for text in ["one", "two", "three"] {
        repos.posts.create(author, &post_form(text, None)).await.unwrap();
    }

    let filter = PostFilter::Author(author);
    assert_eq!(repos.posts.count(&filter).await.unwrap(), 3);
    let posts = repos.posts.list(&filter, 0, 2).await.unwrap();
    let texts: Vec<&str> = posts.iter().map(|p| p.text.as_str()).collect();
    assert_eq!(texts, vec!["three", "two"]);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_group_delete_nulls_post_reference() {
    let repos = Repositories::postgres(create_test_pool().await);
    let slug = format!("g-{}", Uuid::new_v4().simple());
    let group = repos
        .groups
        .create(&GroupForm {
            title: "Temporary".to_string(),
            slug: slug.clone(),
            description: String::new(),
        })
        .await
        .unwrap();
    let post = repos
        .posts
        .create(user(), &post_form("filed", Some(group.id)))
        .await
        .unwrap();

    let duplicate = repos
        .groups
        .create(&GroupForm {
            title: "Again".to_string(),
            slug,
            description: String::new(),
        })
        .await;
    assert!(duplicate.unwrap_err().is_validation());

    assert!(repos.groups.delete(group.id).await.unwrap());
    let post = repos.posts.find(post.id).await.unwrap().unwrap();
    assert_eq!(post.group, None);
}

#[tokio::test]
#[ignore] // Requires database setup
async fn test_purge_user() {
    let repos = Repositories::postgres(create_test_pool().await);
    let (departed, other) = (user(), user());

    let own = repos.posts.create(departed, &post_form("mine", None)).await.unwrap();
    let theirs = repos.posts.create(other, &post_form("theirs", None)).await.unwrap();
    repos.comments.create(own.id, other, "on departed's post").await.unwrap();
    repos.comments.create(theirs.id, departed, "by departed").await.unwrap();
    repos.follows.insert(other, departed).await.unwrap();

    let report = repos.maintenance.purge_user(departed).await.unwrap();

    assert_eq!(report.posts, 1);
    assert_eq!(report.comments, 2);
    assert_eq!(report.follows, 1);
    assert_eq!(repos.comments.count_for_post(theirs.id).await.unwrap(), 0);
}
