/// Comment service - comments always hang off an existing post
use std::sync::Arc;
use validator::Validate;

use crate::db::{CommentRepository, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{Comment, CommentForm, UserId};

#[derive(Clone)]
pub struct CommentService {
    comments: Arc<dyn CommentRepository>,
    posts: Arc<dyn PostRepository>,
}

impl CommentService {
    pub fn new(comments: Arc<dyn CommentRepository>, posts: Arc<dyn PostRepository>) -> Self {
        Self { comments, posts }
    }

    async fn ensure_post(&self, post_id: i64) -> Result<()> {
        match self.posts.find(post_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("post {}", post_id))),
        }
    }

    pub async fn add(&self, post_id: i64, author: UserId, form: CommentForm) -> Result<Comment> {
        self.ensure_post(post_id).await?;
        form.validate()?;

        let comment = self.comments.create(post_id, author, &form.text).await?;
        tracing::info!(post_id, comment_id = comment.id, "comment added");
        Ok(comment)
    }

    pub async fn list(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.ensure_post(post_id).await?;
        self.comments.list_for_post(post_id).await
    }

    pub async fn count(&self, post_id: i64) -> Result<i64> {
        self.comments.count_for_post(post_id).await
    }

    pub async fn get(&self, post_id: i64, id: i64) -> Result<Comment> {
        self.ensure_post(post_id).await?;
        self.comments
            .find(post_id, id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("comment {}", id)))
    }

    pub async fn update(&self, comment: &Comment, form: CommentForm) -> Result<Comment> {
        form.validate()?;
        self.comments.update_text(comment.id, &form.text).await
    }

    pub async fn delete(&self, comment: &Comment) -> Result<()> {
        if !self.comments.delete(comment.id).await? {
            return Err(AppError::NotFound(format!("comment {}", comment.id)));
        }
        Ok(())
    }
}
