use async_trait::async_trait;
use sqlx::PgPool;

use super::FollowRepository;
use crate::error::Result;
use crate::models::{Follow, UserId};

pub struct PgFollowRepository {
    pool: PgPool,
}

impl PgFollowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FollowRepository for PgFollowRepository {
    /// Idempotent insert; the `unique_following` constraint absorbs duplicates.
    async fn insert(&self, user: UserId, author: UserId) -> Result<Option<Follow>> {
        let inserted = sqlx::query_as::<_, Follow>(
            r#"
            INSERT INTO follows (user_id, author_id, created_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (user_id, author_id) DO NOTHING
            RETURNING id, user_id, author_id, created_at
            "#,
        )
        .bind(user)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(inserted)
    }

    async fn find(&self, user: UserId, author: UserId) -> Result<Option<Follow>> {
        let follow = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, user_id, author_id, created_at
            FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user)
        .bind(author)
        .fetch_optional(&self.pool)
        .await?;

        Ok(follow)
    }

    async fn delete(&self, user: UserId, author: UserId) -> Result<bool> {
        let affected = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE user_id = $1 AND author_id = $2
            "#,
        )
        .bind(user)
        .bind(author)
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(affected > 0)
    }

    async fn followers_of(&self, author: UserId) -> Result<Vec<UserId>> {
        let ids = sqlx::query_scalar::<_, UserId>(
            "SELECT user_id FROM follows WHERE author_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn followees_of(&self, user: UserId) -> Result<Vec<UserId>> {
        let ids = sqlx::query_scalar::<_, UserId>(
            "SELECT author_id FROM follows WHERE user_id = $1 ORDER BY created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    async fn list_for_user(&self, user: UserId) -> Result<Vec<Follow>> {
        let follows = sqlx::query_as::<_, Follow>(
            r#"
            SELECT id, user_id, author_id, created_at
            FROM follows
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await?;

        Ok(follows)
    }
}
