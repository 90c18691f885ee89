/// In-process store implementing every repository trait
///
/// One `RwLock` guards all tables so each operation, cascades included, is a
/// single critical section. Foreign-key behaviour mirrors the Postgres schema.
use async_trait::async_trait;
use chrono::Utc;
use std::cmp::Reverse;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{
    CommentRepository, FollowRepository, GroupRepository, MaintenanceRepository, PostFilter,
    PostRepository,
};
use crate::error::{AppError, Result};
use crate::models::{Comment, Follow, Group, GroupForm, Post, PostForm, PurgeReport, UserId};

#[derive(Default)]
struct Tables {
    groups: BTreeMap<i64, Group>,
    posts: BTreeMap<i64, Post>,
    comments: BTreeMap<i64, Comment>,
    follows: BTreeMap<i64, Follow>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn slug_taken(&self, slug: &str, except: Option<i64>) -> bool {
        self.groups
            .values()
            .any(|g| g.slug == slug && Some(g.id) != except)
    }

    fn check_group(&self, group: Option<i64>) -> Result<()> {
        match group {
            Some(id) if !self.groups.contains_key(&id) => Err(AppError::invalid_field(
                "group",
                format!("group {} does not exist", id),
            )),
            _ => Ok(()),
        }
    }

    /// Newest first, insertion order breaking ties.
    fn posts_matching(&self, filter: &PostFilter) -> Vec<&Post> {
        let mut posts: Vec<&Post> = self.posts.values().filter(|p| filter.matches(p)).collect();
        posts.sort_by_key(|p| Reverse((p.created_at, p.id)));
        posts
    }

    fn delete_post(&mut self, id: i64) -> bool {
        let removed = self.posts.remove(&id).is_some();
        if removed {
            self.comments.retain(|_, c| c.post != id);
        }
        removed
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GroupRepository for MemoryStore {
    async fn create(&self, form: &GroupForm) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&form.slug, None) {
            return Err(AppError::invalid_field(
                "slug",
                format!("group with slug '{}' already exists", form.slug),
            ));
        }

        let group = Group {
            id: tables.next_id(),
            title: form.title.clone(),
            slug: form.slug.clone(),
            description: form.description.clone(),
        };
        tables.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn find(&self, id: i64) -> Result<Option<Group>> {
        Ok(self.tables.read().await.groups.get(&id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let tables = self.tables.read().await;
        Ok(tables.groups.values().find(|g| g.slug == slug).cloned())
    }

    async fn list(&self) -> Result<Vec<Group>> {
        let tables = self.tables.read().await;
        let mut groups: Vec<Group> = tables.groups.values().cloned().collect();
        groups.sort_by(|a, b| a.title.cmp(&b.title).then(a.id.cmp(&b.id)));
        Ok(groups)
    }

    async fn update(&self, group: &Group) -> Result<Group> {
        let mut tables = self.tables.write().await;
        if tables.slug_taken(&group.slug, Some(group.id)) {
            return Err(AppError::invalid_field(
                "slug",
                format!("group with slug '{}' already exists", group.slug),
            ));
        }

        let stored = tables
            .groups
            .get_mut(&group.id)
            .ok_or_else(|| AppError::NotFound(format!("group {}", group.id)))?;
        *stored = group.clone();
        Ok(group.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut tables = self.tables.write().await;
        if tables.groups.remove(&id).is_none() {
            return Ok(false);
        }
        for post in tables.posts.values_mut() {
            if post.group == Some(id) {
                post.group = None;
            }
        }
        Ok(true)
    }

    async fn post_count(&self, id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| p.group == Some(id)).count() as i64)
    }
}

#[async_trait]
impl PostRepository for MemoryStore {
    async fn create(&self, author: UserId, form: &PostForm) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.check_group(form.group)?;

        let post = Post {
            id: tables.next_id(),
            text: form.text.clone(),
            created_at: Utc::now(),
            author,
            group: form.group,
            image: form.image.clone(),
        };
        tables.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn find(&self, id: i64) -> Result<Option<Post>> {
        Ok(self.tables.read().await.posts.get(&id).cloned())
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let mut tables = self.tables.write().await;
        tables.check_group(post.group)?;

        let stored = tables
            .posts
            .get_mut(&post.id)
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))?;
        stored.text = post.text.clone();
        stored.group = post.group;
        stored.image = post.image.clone();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.delete_post(id))
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.posts.values().filter(|p| filter.matches(p)).count() as i64)
    }

    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables
            .posts_matching(filter)
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn list_all(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let tables = self.tables.read().await;
        Ok(tables.posts_matching(filter).into_iter().cloned().collect())
    }
}

#[async_trait]
impl CommentRepository for MemoryStore {
    async fn create(&self, post_id: i64, author: UserId, text: &str) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        if !tables.posts.contains_key(&post_id) {
            return Err(AppError::NotFound(format!("post {}", post_id)));
        }

        let comment = Comment {
            id: tables.next_id(),
            post: post_id,
            author,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        tables.comments.insert(comment.id, comment.clone());
        Ok(comment)
    }

    async fn find(&self, post_id: i64, id: i64) -> Result<Option<Comment>> {
        let tables = self.tables.read().await;
        Ok(tables
            .comments
            .get(&id)
            .filter(|c| c.post == post_id)
            .cloned())
    }

    async fn list_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        let tables = self.tables.read().await;
        let mut comments: Vec<Comment> = tables
            .comments
            .values()
            .filter(|c| c.post == post_id)
            .cloned()
            .collect();
        comments.sort_by_key(|c| (c.created_at, c.id));
        Ok(comments)
    }

    async fn count_for_post(&self, post_id: i64) -> Result<i64> {
        let tables = self.tables.read().await;
        Ok(tables.comments.values().filter(|c| c.post == post_id).count() as i64)
    }

    async fn update_text(&self, id: i64, text: &str) -> Result<Comment> {
        let mut tables = self.tables.write().await;
        let stored = tables
            .comments
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("comment {}", id)))?;
        stored.text = text.to_string();
        Ok(stored.clone())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.tables.write().await.comments.remove(&id).is_some())
    }
}

#[async_trait]
impl FollowRepository for MemoryStore {
    async fn insert(&self, user: UserId, author: UserId) -> Result<Option<Follow>> {
        let mut tables = self.tables.write().await;
        if user == author {
            return Err(AppError::invalid_field("author", "users cannot follow themselves"));
        }
        if tables
            .follows
            .values()
            .any(|f| f.user == user && f.author == author)
        {
            return Ok(None);
        }

        let follow = Follow {
            id: tables.next_id(),
            user,
            author,
            created_at: Utc::now(),
        };
        tables.follows.insert(follow.id, follow.clone());
        Ok(Some(follow))
    }

    async fn find(&self, user: UserId, author: UserId) -> Result<Option<Follow>> {
        let tables = self.tables.read().await;
        Ok(tables
            .follows
            .values()
            .find(|f| f.user == user && f.author == author)
            .cloned())
    }

    async fn delete(&self, user: UserId, author: UserId) -> Result<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| !(f.user == user && f.author == author));
        Ok(tables.follows.len() < before)
    }

    async fn followers_of(&self, author: UserId) -> Result<Vec<UserId>> {
        Ok(self
            .list_where(|f| f.author == author)
            .await
            .into_iter()
            .map(|f| f.user)
            .collect())
    }

    async fn followees_of(&self, user: UserId) -> Result<Vec<UserId>> {
        Ok(self
            .list_where(|f| f.user == user)
            .await
            .into_iter()
            .map(|f| f.author)
            .collect())
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Follow>> {
        Ok(self.list_where(|f| f.user == user).await)
    }
}

impl MemoryStore {
    async fn list_where(&self, keep: impl Fn(&Follow) -> bool) -> Vec<Follow> {
        let tables = self.tables.read().await;
        let mut follows: Vec<Follow> = tables.follows.values().filter(|f| keep(f)).cloned().collect();
        follows.sort_by_key(|f| Reverse((f.created_at, f.id)));
        follows
    }
}

#[async_trait]
impl MaintenanceRepository for MemoryStore {
    async fn purge_user(&self, user: UserId) -> Result<PurgeReport> {
        let mut tables = self.tables.write().await;
        let mut report = PurgeReport::default();

        let own_posts: Vec<i64> = tables
            .posts
            .values()
            .filter(|p| p.author == user)
            .map(|p| p.id)
            .collect();

        let comments_before = tables.comments.len();
        tables.comments.retain(|_, c| c.author != user);
        for id in &own_posts {
            tables.delete_post(*id);
        }
        report.posts = own_posts.len() as u64;
        report.comments = (comments_before - tables.comments.len()) as u64;

        let follows_before = tables.follows.len();
        tables
            .follows
            .retain(|_, f| f.user != user && f.author != user);
        report.follows = (follows_before - tables.follows.len()) as u64;

        tracing::info!(
            user_id = %user,
            posts = report.posts,
            comments = report.comments,
            follows = report.follows,
            "purged user content"
        );
        Ok(report)
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}
