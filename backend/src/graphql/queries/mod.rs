pub mod authors;
pub mod posts;

pub use authors::AuthorQueries;
pub use posts::PostQueries;

pub(crate) mod prelude {
    pub(crate) use std::sync::Arc;

    pub(crate) use async_graphql::{Context, ErrorExtensions, ID, Object, Result};

    pub(crate) use crate::db::*;
    pub(crate) use crate::graphql::helpers::*;
    pub(crate) use crate::graphql::pagination::{PageInfo, resolve_pagination};
    pub(crate) use crate::graphql::schema::SchemaSettings;
    pub(crate) use crate::graphql::types::*;
}
