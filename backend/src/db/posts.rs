//! Posts data access
//!
//! Posts are hard-deleted. Reads still filter on `deleted_at IS NULL` so a
//! row stamped by hand or by an older writer is never served.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::pagination::Pagination;
use super::sqlite_helpers::{get_datetime, get_datetime_opt, now_iso8601};
use crate::error::{ServiceError, ServiceResult};

const POST_COLUMNS: &str = "id, post, author_id, created_at, updated_at, deleted_at";

/// Guard on bind `?2`: posts may only be attached to live authors
const LIVE_AUTHOR: &str =
    "EXISTS (SELECT 1 FROM authors WHERE id = ?2 AND deleted_at IS NULL)";

/// Post record from database
#[derive(Debug, Clone, PartialEq)]
pub struct PostRecord {
    pub id: i64,
    pub post: String,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl sqlx::FromRow<'_, SqliteRow> for PostRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        Ok(Self {
            id: row.try_get("id")?,
            post: row.try_get("post")?,
            author_id: row.try_get("author_id")?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime_opt(row, "updated_at")?,
            deleted_at: get_datetime_opt(row, "deleted_at")?,
        })
    }
}

/// Input for creating a post
#[derive(Debug, Clone)]
pub struct CreatePost {
    pub post: String,
    pub author_id: i64,
}

/// Predicates for listing posts
#[derive(Debug, Clone, Default)]
pub struct PostFilter {
    pub author_id: Option<i64>,
}

/// Data-access operations for posts
#[async_trait]
pub trait PostDao: Send + Sync {
    /// Insert a new post; `NotFound` for an unknown or soft-deleted author
    async fn create(&self, input: CreatePost) -> ServiceResult<PostRecord>;

    /// Get a post, `NotFound` if missing
    async fn find_by_id(&self, id: i64) -> ServiceResult<PostRecord>;

    /// List posts matching `filter`, plus the unpaginated match count
    async fn find_all_with_count(
        &self,
        filter: &PostFilter,
        pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<PostRecord>, i64)>;

    /// Overwrite every mutable column of a post. Moving it to an unknown or
    /// soft-deleted author is `NotFound` for that author.
    async fn update(&self, record: PostRecord) -> ServiceResult<PostRecord>;

    /// Remove a post row
    async fn delete(&self, id: i64) -> ServiceResult<()>;
}

/// SQLite-backed post repository
#[derive(Clone)]
pub struct PostRepository {
    pool: SqlitePool,
}

impl PostRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &PostFilter) {
    query.push(" WHERE deleted_at IS NULL");
    if let Some(author_id) = filter.author_id {
        query.push(" AND author_id = ").push_bind(author_id);
    }
}

fn not_found(id: i64) -> ServiceError {
    ServiceError::NotFound { entity: "Post", id }
}

fn author_not_found(id: i64) -> ServiceError {
    ServiceError::NotFound { entity: "Author", id }
}

#[async_trait]
impl PostDao for PostRepository {
    async fn create(&self, input: CreatePost) -> ServiceResult<PostRecord> {
        debug!(author_id = input.author_id, "Creating post");

        sqlx::query_as::<_, PostRecord>(&format!(
            r#"
            INSERT INTO posts (post, author_id, created_at, updated_at)
            SELECT ?1, ?2, ?3, ?3
            WHERE {LIVE_AUTHOR}
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&input.post)
        .bind(input.author_id)
        .bind(now_iso8601())
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| author_not_found(input.author_id))
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<PostRecord> {
        debug!(post_id = id, "Finding post");

        sqlx::query_as::<_, PostRecord>(&format!(
            "SELECT {POST_COLUMNS} FROM posts WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn find_all_with_count(
        &self,
        filter: &PostFilter,
        pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<PostRecord>, i64)> {
        debug!(?filter, ?pagination, "Listing posts");

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {POST_COLUMNS} FROM posts"));
        push_filter(&mut query, filter);
        query.push(" ORDER BY id ASC");
        if let Some(page) = pagination {
            query
                .push(" LIMIT ")
                .push_bind(page.limit)
                .push(" OFFSET ")
                .push_bind(page.offset());
        }

        let records = query
            .build_query_as::<PostRecord>()
            .fetch_all(&self.pool)
            .await?;

        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM posts");
        push_filter(&mut count, filter);

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((records, total))
    }

    async fn update(&self, record: PostRecord) -> ServiceResult<PostRecord> {
        debug!(post_id = record.id, "Updating post");

        let updated = sqlx::query_as::<_, PostRecord>(&format!(
            r#"
            UPDATE posts
            SET post = ?1, author_id = ?2, updated_at = ?3
            WHERE id = ?4 AND deleted_at IS NULL AND (author_id = ?2 OR {LIVE_AUTHOR})
            RETURNING {POST_COLUMNS}
            "#
        ))
        .bind(&record.post)
        .bind(record.author_id)
        .bind(now_iso8601())
        .bind(record.id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(updated) = updated {
            return Ok(updated);
        }

        // Zero rows: either the post is gone or the new author is not live
        let post_exists: i64 = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?1 AND deleted_at IS NULL)",
        )
        .bind(record.id)
        .fetch_one(&self.pool)
        .await?;

        if post_exists != 0 {
            Err(author_not_found(record.author_id))
        } else {
            Err(not_found(record.id))
        }
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        debug!(post_id = id, "Deleting post");

        let result = sqlx::query("DELETE FROM posts WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
