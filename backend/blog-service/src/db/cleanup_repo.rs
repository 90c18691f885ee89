use async_trait::async_trait;
use sqlx::PgPool;

use super::MaintenanceRepository;
use crate::error::Result;
use crate::models::{PurgeReport, UserId};

pub struct PgMaintenanceRepository {
    pool: PgPool,
}

impl PgMaintenanceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MaintenanceRepository for PgMaintenanceRepository {
    async fn purge_user(&self, user: UserId) -> Result<PurgeReport> {
        let mut tx = self.pool.begin().await?;

        // Comments under the user's posts go with the posts (ON DELETE CASCADE),
        // so count them first.
        let cascaded: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM comments c
            JOIN posts p ON p.id = c.post_id
            WHERE p.author_id = $1 AND c.author_id <> $1
            "#,
        )
        .bind(user)
        .fetch_one(&mut *tx)
        .await?;

        let own_comments = sqlx::query("DELETE FROM comments WHERE author_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let posts = sqlx::query("DELETE FROM posts WHERE author_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let follows = sqlx::query("DELETE FROM follows WHERE user_id = $1 OR author_id = $1")
            .bind(user)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;

        let report = PurgeReport {
            posts,
            comments: own_comments + cascaded.max(0) as u64,
            follows,
        };
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
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
