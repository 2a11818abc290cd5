//! Authors data access
//!
//! Authors are soft-deleted: `delete` stamps `deleted_at` and every read,
//! update and delete is restricted to rows where `deleted_at IS NULL`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::debug;

use super::pagination::Pagination;
use super::sqlite_helpers::{get_datetime, get_datetime_opt, now_iso8601};
use crate::error::{ServiceError, ServiceResult};

const AUTHOR_COLUMNS: &str = "id, email, first_name, last_name, created_at, updated_at, deleted_at";

/// Author record from database
#[derive(Debug, Clone, PartialEq)]
pub struct AuthorRecord {
    pub id: i64,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl sqlx::FromRow<'_, SqliteRow> for AuthorRecord {
    fn from_row(row: &SqliteRow) -> sqlx::Result<Self> {
        use sqlx::Row;

        Ok(Self {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            created_at: get_datetime(row, "created_at")?,
            updated_at: get_datetime_opt(row, "updated_at")?,
            deleted_at: get_datetime_opt(row, "deleted_at")?,
        })
    }
}

/// Input for creating an author
#[derive(Debug, Clone)]
pub struct CreateAuthor {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Predicates for listing authors
#[derive(Debug, Clone, Default)]
pub struct AuthorFilter {
    pub email: Option<String>,
}

/// Data-access operations for authors
#[async_trait]
pub trait AuthorDao: Send + Sync {
    /// Insert a new author and return it with its generated id
    async fn create(&self, input: CreateAuthor) -> ServiceResult<AuthorRecord>;

    /// Get a live author, `NotFound` if missing or soft-deleted
    async fn find_by_id(&self, id: i64) -> ServiceResult<AuthorRecord>;

    /// Get the live authors among `ids`
    async fn find_by_ids(&self, ids: &[i64]) -> ServiceResult<Vec<AuthorRecord>>;

    /// List live authors matching `filter`, plus the unpaginated match count
    async fn find_all_with_count(
        &self,
        filter: &AuthorFilter,
        pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<AuthorRecord>, i64)>;

    /// Overwrite every mutable column of a live author
    async fn update(&self, record: AuthorRecord) -> ServiceResult<AuthorRecord>;

    /// Soft-delete a live author
    async fn delete(&self, id: i64) -> ServiceResult<()>;
}

/// SQLite-backed author repository
#[derive(Clone)]
pub struct AuthorRepository {
    pool: SqlitePool,
}

impl AuthorRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &AuthorFilter) {
    query.push(" WHERE deleted_at IS NULL");
    if let Some(email) = &filter.email {
        query.push(" AND email = ").push_bind(email.clone());
    }
}

fn not_found(id: i64) -> ServiceError {
    ServiceError::NotFound {
        entity: "Author",
        id,
    }
}

#[async_trait]
impl AuthorDao for AuthorRepository {
    async fn create(&self, input: CreateAuthor) -> ServiceResult<AuthorRecord> {
        debug!(email = %input.email, "Creating author");

        let record = sqlx::query_as::<_, AuthorRecord>(&format!(
            r#"
            INSERT INTO authors (email, first_name, last_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?4)
            RETURNING {AUTHOR_COLUMNS}
            "#
        ))
        .bind(&input.email)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(now_iso8601())
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    async fn find_by_id(&self, id: i64) -> ServiceResult<AuthorRecord> {
        debug!(author_id = id, "Finding author");

        sqlx::query_as::<_, AuthorRecord>(&format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = ?1 AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(id))
    }

    async fn find_by_ids(&self, ids: &[i64]) -> ServiceResult<Vec<AuthorRecord>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        debug!(count = ids.len(), "Batch loading authors");

        let mut query = QueryBuilder::<Sqlite>::new(format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE deleted_at IS NULL AND id IN ("
        ));
        let mut separated = query.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let records = query
            .build_query_as::<AuthorRecord>()
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn find_all_with_count(
        &self,
        filter: &AuthorFilter,
        pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<AuthorRecord>, i64)> {
        debug!(?filter, ?pagination, "Listing authors");

        let mut query = QueryBuilder::<Sqlite>::new(format!("SELECT {AUTHOR_COLUMNS} FROM authors"));
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
            .build_query_as::<AuthorRecord>()
            .fetch_all(&self.pool)
            .await?;

        // Separate statement: the count may observe a different snapshot
        let mut count = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM authors");
        push_filter(&mut count, filter);

        let total: i64 = count
            .build_query_scalar()
            .fetch_one(&self.pool)
            .await?;

        Ok((records, total))
    }

    async fn update(&self, record: AuthorRecord) -> ServiceResult<AuthorRecord> {
        debug!(author_id = record.id, "Updating author");

        sqlx::query_as::<_, AuthorRecord>(&format!(
            r#"
            UPDATE authors
            SET email = ?1, first_name = ?2, last_name = ?3, updated_at = ?4
            WHERE id = ?5 AND deleted_at IS NULL
            RETURNING {AUTHOR_COLUMNS}
            "#
        ))
        .bind(&record.email)
        .bind(&record.first_name)
        .bind(&record.last_name)
        .bind(now_iso8601())
        .bind(record.id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| not_found(record.id))
    }

    async fn delete(&self, id: i64) -> ServiceResult<()> {
        debug!(author_id = id, "Soft-deleting author");

        let result = sqlx::query(
            r#"
            UPDATE authors
            SET deleted_at = ?1, updated_at = ?1
            WHERE id = ?2 AND deleted_at IS NULL
            "#,
        )
        .bind(now_iso8601())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(id));
        }
        Ok(())
    }
}
