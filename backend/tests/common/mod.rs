//! Common test utilities for integration tests
//!
//! Schemas run against a private in-memory SQLite database, or against the
//! data-access and throttle doubles defined here when a test needs to force
//! a particular failure.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_graphql::Request;
use async_trait::async_trait;
use serde_json::Value;

use scribe::db::{
    AuthorDao, AuthorFilter, AuthorRecord, CreateAuthor, CreatePost, Database, Pagination,
    PostDao, PostFilter, PostRecord,
};
use scribe::error::{ServiceError, ServiceResult};
use scribe::graphql::{SchemaSettings, ScribeSchema, build_schema, build_schema_for_database};
use scribe::services::{InMemoryThrottle, Throttle};

/// Test context holding a migrated in-memory database and a schema over it
pub struct TestContext {
    pub db: Database,
    pub schema: ScribeSchema,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        Self::with_settings(SchemaSettings::default()).await
    }

    pub async fn with_settings(settings: SchemaSettings) -> anyhow::Result<Self> {
        let db = Database::connect_in_memory().await?;
        let schema = build_schema_for_database(&db, Arc::new(InMemoryThrottle::new()), settings);
        Ok(Self { db, schema })
    }

    /// Execute a GraphQL document and return the serialized response
    pub async fn execute(&self, query: &str) -> Value {
        execute(&self.schema, query).await
    }

    /// Create an author through the API and return its id
    pub async fn create_author(&self, email: &str) -> String {
        let response = self
            .execute(&format!(
                r#"mutation {{ createAuthor(input: {{ email: "{email}" }}) {{ id }} }}"#
            ))
            .await;
        assert_no_errors(&response);
        response["data"]["createAuthor"]["id"]
            .as_str()
            .expect("author id")
            .to_string()
    }

    /// Create a post through the API and return its id
    pub async fn create_post(&self, author_id: &str, body: &str) -> String {
        let response = self
            .execute(&format!(
                r#"mutation {{ createPost(input: {{ post: "{body}", authorId: "{author_id}" }}) {{ id }} }}"#
            ))
            .await;
        assert_no_errors(&response);
        response["data"]["createPost"]["id"]
            .as_str()
            .expect("post id")
            .to_string()
    }
}

pub async fn execute(schema: &ScribeSchema, query: &str) -> Value {
    let response = schema.execute(Request::new(query)).await;
    serde_json::to_value(&response).expect("serializable response")
}

pub fn assert_no_errors(response: &Value) {
    assert!(
        response.get("errors").is_none(),
        "unexpected errors: {}",
        response
    );
}

/// `code` extension of the first error, if any
pub fn first_error_code(response: &Value) -> Option<&str> {
    response["errors"][0]["extensions"]["code"].as_str()
}

/// Schema over arbitrary doubles
pub fn schema_with(
    authors: Arc<dyn AuthorDao>,
    posts: Arc<dyn PostDao>,
    throttle: Arc<dyn Throttle>,
) -> ScribeSchema {
    build_schema(authors, posts, throttle, SchemaSettings::default())
}

/// Throttle that denies every request
pub struct DenyingThrottle {
    pub retry_after_secs: u64,
}

#[async_trait]
impl Throttle for DenyingThrottle {
    async fn check(&self, _identity: &str, _limit: u32, _window: Duration) -> ServiceResult<()> {
        Err(ServiceError::RateLimitExceeded {
            retry_after_secs: self.retry_after_secs,
        })
    }
}

/// Throttle whose backend is unreachable
pub struct UnavailableThrottle;

#[async_trait]
impl Throttle for UnavailableThrottle {
    async fn check(&self, _identity: &str, _limit: u32, _window: Duration) -> ServiceResult<()> {
        Err(ServiceError::ThrottleUnavailable("connection refused".to_string()))
    }
}

/// Throttle that records the identities it was asked about
#[derive(Default)]
pub struct RecordingThrottle {
    pub identities: parking_lot::Mutex<Vec<String>>,
}

#[async_trait]
impl Throttle for RecordingThrottle {
    async fn check(&self, identity: &str, _limit: u32, _window: Duration) -> ServiceResult<()> {
        self.identities.lock().push(identity.to_string());
        Ok(())
    }
}

/// Data-access double that counts calls and fails every one of them with a
/// store error
#[derive(Default)]
pub struct FailingDao {
    pub calls: AtomicUsize,
}

impl FailingDao {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> ServiceResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ServiceError::Persistence(sqlx::Error::PoolTimedOut))
    }
}

#[async_trait]
impl AuthorDao for FailingDao {
    async fn create(&self, _input: CreateAuthor) -> ServiceResult<AuthorRecord> {
        self.fail()
    }

    async fn find_by_id(&self, _id: i64) -> ServiceResult<AuthorRecord> {
        self.fail()
    }

    async fn find_by_ids(&self, _ids: &[i64]) -> ServiceResult<Vec<AuthorRecord>> {
        self.fail()
    }

    async fn find_all_with_count(
        &self,
        _filter: &AuthorFilter,
        _pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<AuthorRecord>, i64)> {
        self.fail()
    }

    async fn update(&self, _record: AuthorRecord) -> ServiceResult<AuthorRecord> {
        self.fail()
    }

    async fn delete(&self, _id: i64) -> ServiceResult<()> {
        self.fail()
    }
}

#[async_trait]
impl PostDao for FailingDao {
    async fn create(&self, _input: CreatePost) -> ServiceResult<PostRecord> {
        self.fail()
    }

    async fn find_by_id(&self, _id: i64) -> ServiceResult<PostRecord> {
        self.fail()
    }

    async fn find_all_with_count(
        &self,
        _filter: &PostFilter,
        _pagination: Option<Pagination>,
    ) -> ServiceResult<(Vec<PostRecord>, i64)> {
        self.fail()
    }

    async fn update(&self, _record: PostRecord) -> ServiceResult<PostRecord> {
        self.fail()
    }

    async fn delete(&self, _id: i64) -> ServiceResult<()> {
        self.fail()
    }
}
