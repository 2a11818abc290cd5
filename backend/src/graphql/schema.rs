//! GraphQL schema definition with queries and mutations
//!
//! Data-access objects and the throttle are injected as schema data, so the
//! same schema runs against SQLite in production and test doubles in tests.

use std::sync::Arc;

use async_graphql::dataloader::DataLoader;
use async_graphql::extensions::Tracing;
use async_graphql::{EmptySubscription, MergedObject, Schema};

use super::loaders::AuthorLoader;
use super::mutations::{AuthorMutations, PostMutations};
use super::queries::{AuthorQueries, PostQueries};
use crate::db::{AuthorDao, Database, PostDao};
use crate::services::{Throttle, ThrottlePolicy};

/// The GraphQL schema type
pub type ScribeSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

#[derive(MergedObject, Default)]
pub struct QueryRoot(AuthorQueries, PostQueries);

#[derive(MergedObject, Default)]
pub struct MutationRoot(AuthorMutations, PostMutations);

/// Resolver tuning shared through schema data
#[derive(Debug, Clone, Copy)]
pub struct SchemaSettings {
    pub throttle: ThrottlePolicy,
    pub max_page_size: i32,
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            throttle: ThrottlePolicy::default(),
            max_page_size: 100,
        }
    }
}

/// Build the GraphQL schema with all resolvers
pub fn build_schema(
    authors: Arc<dyn AuthorDao>,
    posts: Arc<dyn PostDao>,
    throttle: Arc<dyn Throttle>,
    settings: SchemaSettings,
) -> ScribeSchema {
    let author_loader = DataLoader::new(AuthorLoader::new(authors.clone()), tokio::spawn);

    Schema::build(QueryRoot::default(), MutationRoot::default(), EmptySubscription)
        .extension(Tracing)
        .data(authors)
        .data(posts)
        .data(throttle)
        .data(settings)
        .data(author_loader)
        .finish()
}

/// Build the schema over the SQLite repositories of `db`
pub fn build_schema_for_database(
    db: &Database,
    throttle: Arc<dyn Throttle>,
    settings: SchemaSettings,
) -> ScribeSchema {
    build_schema(
        Arc::new(db.authors()),
        Arc::new(db.posts()),
        throttle,
        settings,
    )
}
