use async_trait::async_trait;
use sqlx::PgPool;

use super::{is_unique_violation, GroupRepository};
use crate::error::{AppError, Result};
use crate::models::{Group, GroupForm};

pub struct PgGroupRepository {
    pool: PgPool,
}

impl PgGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn map_slug_conflict(err: sqlx::Error, slug: &str) -> AppError {
    if is_unique_violation(&err) {
        AppError::invalid_field("slug", format!("group with slug '{}' already exists", slug))
    } else {
        err.into()
    }
}

#[async_trait]
impl GroupRepository for PgGroupRepository {
    async fn create(&self, form: &GroupForm) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            INSERT INTO groups (title, slug, description)
            VALUES ($1, $2, $3)
            RETURNING id, title, slug, description
            "#,
        )
        .bind(&form.title)
        .bind(&form.slug)
        .bind(&form.description)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_slug_conflict(e, &form.slug))
    }

    async fn find(&self, id: i64) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>> {
        let group = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups WHERE slug = $1",
        )
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;

        Ok(group)
    }

    async fn list(&self) -> Result<Vec<Group>> {
        let groups = sqlx::query_as::<_, Group>(
            "SELECT id, title, slug, description FROM groups ORDER BY title, id",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(groups)
    }

    async fn update(&self, group: &Group) -> Result<Group> {
        sqlx::query_as::<_, Group>(
            r#"
            UPDATE groups
            SET title = $2, slug = $3, description = $4
            WHERE id = $1
            RETURNING id, title, slug, description
            "#,
        )
        .bind(group.id)
        .bind(&group.title)
        .bind(&group.slug)
        .bind(&group.description)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_slug_conflict(e, &group.slug))?
        .ok_or_else(|| AppError::NotFound(format!("group {}", group.id)))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // posts.group_id is ON DELETE SET NULL
        let affected = sqlx::query("DELETE FROM groups WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn post_count(&self, id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE group_id = $1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
