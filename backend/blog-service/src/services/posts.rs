/// Post service - creation, retrieval and edits of posts
use std::sync::Arc;
use validator::Validate;

use crate::db::{GroupRepository, PostFilter, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{Post, PostForm, PostPatch, UserId};

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    groups: Arc<dyn GroupRepository>,
}

impl PostService {
    pub fn new(posts: Arc<dyn PostRepository>, groups: Arc<dyn GroupRepository>) -> Self {
        Self { posts, groups }
    }

    async fn ensure_group(&self, group: Option<i64>) -> Result<()> {
        if let Some(id) = group {
            if self.groups.find(id).await?.is_none() {
                return Err(AppError::invalid_field(
                    "group",
                    format!("group {} does not exist", id),
                ));
            }
        }
        Ok(())
    }

    pub async fn create(&self, author: UserId, form: PostForm) -> Result<Post> {
        form.validate()?;
        self.ensure_group(form.group).await?;

        let post = self.posts.create(author, &form).await?;
        tracing::info!(post_id = post.id, author = %author, "post created");
        Ok(post)
    }

    pub async fn get(&self, id: i64) -> Result<Post> {
        self.posts
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("post {}", id)))
    }

    /// Apply `patch` to an already-authorized post. On a validation failure
    /// the stored post is left as it was.
    pub async fn update(&self, mut post: Post, patch: PostPatch) -> Result<Post> {
        patch.validate()?;
        self.ensure_group(patch.new_group()).await?;

        patch.apply(&mut post);
        let updated = self.posts.update(&post).await?;
        tracing::info!(post_id = updated.id, "post updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        if !self.posts.delete(id).await? {
            return Err(AppError::NotFound(format!("post {}", id)));
        }
        tracing::info!(post_id = id, "post deleted");
        Ok(())
    }

    pub async fn count(&self, filter: &PostFilter) -> Result<i64> {
        self.posts.count(filter).await
    }

    pub async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>> {
        self.posts.list(filter, offset, limit).await
    }

    /// Every post matching `filter`, newest first.
    pub async fn list_all(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        self.posts.list_all(filter).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use uuid::Uuid;

    fn service() -> PostService {
        let store = Arc::new(MemoryStore::new());
        PostService::new(store.clone(), store)
    }

    fn form(text: &str) -> PostForm {
        PostForm {
            text: text.to_string(),
            group: None,
            image: None,
        }
    }

    #[tokio::test]
    async fn invalid_edit_leaves_post_unchanged() {
        let service = service();
        let post = service
            .create(UserId(Uuid::new_v4()), form("original"))
            .await
            .unwrap();

        let patch = PostPatch {
            text: Some("x".repeat(3001)),
            ..Default::default()
        };
        let err = service.update(post.clone(), patch).await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(service.get(post.id).await.unwrap().text, "original");
    }

    #[tokio::test]
    async fn unknown_group_is_a_field_error() {
        let service = service();
        let mut bad = form("hello");
        bad.group = Some(77);

        match service.create(UserId(Uuid::new_v4()), bad).await {
            Err(AppError::Validation { fields, .. }) => assert!(fields.contains_key("group")),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn created_at_survives_edit() {
        let service = service();
        let post = service
            .create(UserId(Uuid::new_v4()), form("before"))
            .await
            .unwrap();

        let updated = service
            .update(post.clone(), PostPatch::from(form("after")))
            .await
            .unwrap();
        assert_eq!(updated.text, "after");
        assert_eq!(updated.created_at, post.created_at);
        assert_eq!(updated.author, post.author);
    }
}
