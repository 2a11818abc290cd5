//! GraphQL type definitions
//!
//! These types mirror the database records but are decorated with
//! async-graphql attributes. Timestamps are exposed as Unix epoch seconds.

use async_graphql::dataloader::DataLoader;
use async_graphql::{
    ComplexObject, Context, ErrorExtensions, ID, InputObject, MaybeUndefined, Result, SimpleObject,
};

use super::loaders::AuthorLoader;
use super::pagination::PageInfo;

/// A registered author
#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct Author {
    pub id: ID,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Creation time (epoch seconds)
    pub created_at: i64,
    /// Last modification time (epoch seconds)
    pub updated_at: Option<i64>,
    /// Soft-delete time (epoch seconds), null while the author is live
    pub deleted_at: Option<i64>,
}

/// A post written by an author
#[derive(Debug, Clone, PartialEq, SimpleObject)]
#[graphql(complex)]
pub struct Post {
    pub id: ID,
    pub post: String,
    pub author_id: ID,
    pub created_at: i64,
    pub updated_at: Option<i64>,
    pub deleted_at: Option<i64>,
    #[graphql(skip)]
    pub author_key: i64,
}

#[ComplexObject]
impl Post {
    /// The owning author, null once the author has been deleted
    async fn author(&self, ctx: &Context<'_>) -> Result<Option<Author>> {
        let loader = ctx.data_unchecked::<DataLoader<AuthorLoader>>();
        let record = loader
            .load_one(self.author_key)
            .await
            .map_err(|e| e.as_ref().extend())?;

        Ok(record.map(Author::from))
    }
}

/// Page selection for list queries. Pages are zero-based.
#[derive(Debug, Clone, Copy, InputObject)]
pub struct PaginationInput {
    pub page: i32,
    pub limit: i32,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct AuthorQueryInput {
    /// Exact email match
    pub email: Option<String>,
}

#[derive(Debug, Clone, Default, InputObject)]
pub struct PostQueryInput {
    /// Only posts by this author
    pub author_id: Option<ID>,
}

#[derive(Debug, Clone, InputObject)]
pub struct AuthorCreateInput {
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

/// Omitted fields keep their value; an explicit null clears a name
#[derive(Debug, Clone, InputObject)]
pub struct AuthorUpdateInput {
    pub id: ID,
    pub email: Option<String>,
    pub first_name: MaybeUndefined<String>,
    pub last_name: MaybeUndefined<String>,
}

#[derive(Debug, Clone, InputObject)]
pub struct AuthorDeleteInput {
    pub id: ID,
}

#[derive(Debug, Clone, InputObject)]
pub struct PostCreateInput {
    pub post: String,
    pub author_id: ID,
}

#[derive(Debug, Clone, InputObject)]
pub struct PostUpdateInput {
    pub id: ID,
    pub post: Option<String>,
    pub author_id: Option<ID>,
}

#[derive(Debug, Clone, InputObject)]
pub struct PostDeleteInput {
    pub id: ID,
}

/// A page of authors
#[derive(Debug, Clone, SimpleObject)]
pub struct AuthorsPayload {
    pub authors: Vec<Author>,
    pub page_info: PageInfo,
}

/// A page of posts
#[derive(Debug, Clone, SimpleObject)]
pub struct PostsPayload {
    pub posts: Vec<Post>,
    pub page_info: PageInfo,
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct AuthorDeletePayload {
    pub id: ID,
}

#[derive(Debug, Clone, PartialEq, SimpleObject)]
pub struct PostDeletePayload {
    pub id: ID,
}
