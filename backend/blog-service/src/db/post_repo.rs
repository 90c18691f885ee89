use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{is_foreign_key_violation, PostFilter, PostRepository};
use crate::error::{AppError, Result};
use crate::models::{Post, PostForm, UserId};

const POST_COLUMNS: &str = "id, text, created_at, author_id, group_id, image";

pub struct PgPostRepository {
    pool: PgPool,
}

impl PgPostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Appends the `WHERE` clause for `filter`.
fn push_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &PostFilter) {
    match filter {
        PostFilter::All => {}
        PostFilter::Group(group) => {
            builder.push(" WHERE group_id = ").push_bind(*group);
        }
        PostFilter::Author(author) => {
            builder.push(" WHERE author_id = ").push_bind(author.0);
        }
        PostFilter::Authors(authors) => {
            let ids: Vec<uuid::Uuid> = authors.iter().map(|a| a.0).collect();
            builder.push(" WHERE author_id = ANY(").push_bind(ids).push(")");
        }
    }
}

fn map_group_reference(err: sqlx::Error, group: Option<i64>) -> AppError {
    if is_foreign_key_violation(&err) {
        AppError::invalid_field(
            "group",
            format!("group {} does not exist", group.unwrap_or_default()),
        )
    } else {
        err.into()
    }
}

#[async_trait]
impl PostRepository for PgPostRepository {
    async fn create(&self, author: UserId, form: &PostForm) -> Result<Post> {
        let sql = format!(
            "INSERT INTO posts (text, author_id, group_id, image) VALUES ($1, $2, $3, $4) RETURNING {}",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(&form.text)
            .bind(author)
            .bind(form.group)
            .bind(&form.image)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_group_reference(e, form.group))
    }

    async fn find(&self, id: i64) -> Result<Option<Post>> {
        let sql = format!("SELECT {} FROM posts WHERE id = $1", POST_COLUMNS);
        let post = sqlx::query_as::<_, Post>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(post)
    }

    async fn update(&self, post: &Post) -> Result<Post> {
        let sql = format!(
            "UPDATE posts SET text = $2, group_id = $3, image = $4 WHERE id = $1 RETURNING {}",
            POST_COLUMNS
        );
        sqlx::query_as::<_, Post>(&sql)
            .bind(post.id)
            .bind(&post.text)
            .bind(post.group)
            .bind(&post.image)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_group_reference(e, post.group))?
            .ok_or_else(|| AppError::NotFound(format!("post {}", post.id)))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        // comments.post_id is ON DELETE CASCADE
        let affected = sqlx::query("DELETE FROM posts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(affected > 0)
    }

    async fn count(&self, filter: &PostFilter) -> Result<i64> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut builder, filter);

        let count: i64 = builder
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn list(&self, filter: &PostFilter, offset: i64, limit: i64) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut builder, filter);
        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    async fn list_all(&self, filter: &PostFilter) -> Result<Vec<Post>> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM posts", POST_COLUMNS));
        push_filter(&mut builder, filter);
        builder.push(" ORDER BY created_at DESC, id DESC");

        let posts = builder
            .build_query_as::<Post>()
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }
}
