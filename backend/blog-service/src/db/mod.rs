/// Storage layer for the blog service
///
/// Each aggregate has a repository trait with a Postgres implementation
/// (`*_repo` modules) and a shared in-process implementation (`memory`) used
/// by tests and `STORAGE_BACKEND=memory`.
pub mod cleanup_repo;
pub mod comment_repo;
pub mod follow_repo;
pub mod group_repo;
pub mod memory;
pub mod post_repo;

use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;

use crate::error::Result;
use crate::models::{
    Comment, Follow, Group, GroupForm, Post, PostForm, PurgeReport, UserId,
};

pub use memory::MemoryStore;

/// Which posts a listing selects. Every listing is ordered newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PostFilter {
    All,
    Group(i64),
    Author(UserId),
    Authors(Vec<UserId>),
}

impl PostFilter {
    pub fn matches(&self, post: &Post) -> bool {
        match self {
            PostFilter::All => true,
            PostFilter::Group(group) => post.group == Some(*group),
            PostFilter::Author(author) => post.author == *author,
            PostFilter::Authors(authors) => authors.contains(&post.author),
        }
    }
}

#[async_trait]
pub trait GroupRepository: Send + Sync {
    async fn create(&self, form: &GroupForm) -> Result<Group>;

    async fn find(&self, id: i64) -> Result<Option<Group>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>>;

    /// All groups ordered by title
    async fn list(&self) -> Result<Vec<Group>>;

    async fn update(&self, group: &Group) -> Result<Group>;

    /// Posts referencing the group keep existing with no group.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// Number of posts filed under the group
    async fn post_count(&self, id: i64) -> Result<i64>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create(&self, author: UserId, form: &PostForm) -> Result<Post>;

    async fn find(&self, id: i64) -> Result<Option<Post>>;

    /// Persist `text`, `group` and `image`; `created_at` and `author` are fixed.
    async fn update(&self, post: &Post) -> Result<Post>;

    /// Deletes the post's comments with it.
    async fn delete(&self, id: i64) -> Result<bool>;

    async fn count(&self, filter: &PostFilter) -> Result<i64>;

    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>>;

    /// Every matching post in one read, newest first
    async fn list_all(&self, filter: &PostFilter) -> Result<Vec<Post>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, post_id: i64, author: UserId, text: &str) -> Result<Comment>;

    /// A comment is only found through the post it belongs to.
    async fn find(&self, post_id: i64, id: i64) -> Result<Option<Comment>>;

    /// Oldest first
    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>>;

    async fn count_for_post(&self, post_id: i64) -> Result<i64>;

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

#[async_trait]
pub trait FollowRepository: Send + Sync {
    /// `None` when the pair already exists.
    async fn insert(&self, user: UserId, author: UserId) -> Result<Option<Follow>>;

    async fn find(&self, user: UserId, author: UserId) -> Result<Option<Follow>>;

    async fn delete(&self, user: UserId, author: UserId) -> Result<bool>;

    async fn followers_of(&self, author: UserId) -> Result<Vec<UserId>>;

    async fn followees_of(&self, user: UserId) -> Result<Vec<UserId>>;

    /// Follow records owned by `user`, newest first
    async fn list_for_user(&self, user: UserId) -> Result<Vec<Follow>>;
}

#[async_trait]
pub trait MaintenanceRepository: Send + Sync {
    /// Remove everything a departed user owns, in one transaction.
    async fn purge_user(&self, user: UserId) -> Result<PurgeReport>;

    async fn health_check(&self) -> Result<()>;
}

/// The repositories a running service needs, behind trait objects.
#[derive(Clone)]
pub struct Repositories {
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
    pub maintenance: Arc<dyn MaintenanceRepository>,
}

impl Repositories {
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            groups: Arc::new(group_repo::PgGroupRepository::new(pool.clone())),
            posts: Arc::new(post_repo::PgPostRepository::new(pool.clone())),
            comments: Arc::new(comment_repo::PgCommentRepository::new(pool.clone())),
            follows: Arc::new(follow_repo::PgFollowRepository::new(pool.clone())),
            maintenance: Arc::new(cleanup_repo::PgMaintenanceRepository::new(pool)),
        }
    }

    pub fn memory() -> Self {
        Self::from_memory(Arc::new(MemoryStore::new()))
    }

    pub fn from_memory(store: Arc<MemoryStore>) -> Self {
        Self {
            groups: store.clone(),
            posts: store.clone(),
            comments: store.clone(),
            follows: store.clone(),
            maintenance: store,
        }
    }
}

/// Postgres error code for `unique_violation`
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23505"))
}

/// Postgres error code for `foreign_key_violation`
pub(crate) fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("23503"))
}
