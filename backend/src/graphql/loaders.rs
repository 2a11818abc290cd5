//! GraphQL DataLoaders for batching database queries
//!
//! Resolving `posts { author { ... } }` would otherwise issue one author
//! query per post. The loader collects the author ids requested in the same
//! tick and fetches them with a single `IN (...)` query.

use std::collections::HashMap;
use std::sync::Arc;

use async_graphql::dataloader::Loader;

use crate::db::{AuthorDao, AuthorRecord};
use crate::error::ServiceError;

/// Batch loader for live authors by id
pub struct AuthorLoader {
    authors: Arc<dyn AuthorDao>,
}

impl AuthorLoader {
    pub fn new(authors: Arc<dyn AuthorDao>) -> Self {
        Self { authors }
    }
}

impl Loader<i64> for AuthorLoader {
    type Value = AuthorRecord;
    type Error = Arc<ServiceError>;

    async fn load(&self, keys: &[i64]) -> Result<HashMap<i64, Self::Value>, Self::Error> {
        tracing::debug!(author_count = keys.len(), "Batch loading authors");

        let records = self.authors.find_by_ids(keys).await.map_err(Arc::new)?;

        Ok(records.into_iter().map(|r| (r.id, r)).collect())
    }
}
