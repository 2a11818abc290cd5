//! GraphQL API
//!
//! This module provides the GraphQL API using async-graphql. Queries and
//! mutations are split per entity under `queries/` and `mutations/`, each
//! file defining a `#[derive(Default)]` struct with an `#[Object]` impl that
//! `schema.rs` merges into `QueryRoot`/`MutationRoot`.
//!
//! Mutations run in a fixed order: validate input, consult the throttle,
//! call the data-access object, map the record to its GraphQL type.

pub mod helpers;
pub mod identity;
pub mod loaders;
pub mod mutations;
pub mod pagination;
pub mod queries;
mod schema;
pub mod types;

pub use identity::{ClientIdentity, IdentityExt};
pub use pagination::PageInfo;
pub use schema::{
    MutationRoot, QueryRoot, SchemaSettings, ScribeSchema, build_schema, build_schema_for_database,
};
