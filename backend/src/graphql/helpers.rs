// Helper functions shared across GraphQL query/mutation modules.

use std::sync::Arc;

use async_graphql::{Context, ErrorExtensions, ID};

use crate::db::{AuthorRecord, PostRecord};
use crate::error::{ServiceError, ServiceResult};
use crate::graphql::identity::IdentityExt;
use crate::graphql::schema::SchemaSettings;
use crate::graphql::types::{Author, Post};
use crate::services::Throttle;

impl From<AuthorRecord> for Author {
    fn from(r: AuthorRecord) -> Self {
        Author {
            id: ID::from(r.id.to_string()),
            email: r.email,
            first_name: r.first_name,
            last_name: r.last_name,
            created_at: r.created_at.timestamp(),
            updated_at: r.updated_at.map(|t| t.timestamp()),
            deleted_at: r.deleted_at.map(|t| t.timestamp()),
        }
    }
}

impl From<PostRecord> for Post {
    fn from(r: PostRecord) -> Self {
        Post {
            id: ID::from(r.id.to_string()),
            post: r.post,
            author_id: ID::from(r.author_id.to_string()),
            created_at: r.created_at.timestamp(),
            updated_at: r.updated_at.map(|t| t.timestamp()),
            deleted_at: r.deleted_at.map(|t| t.timestamp()),
            author_key: r.author_id,
        }
    }
}

/// Parse a GraphQL ID into a positive row id
pub(crate) fn parse_id(id: &ID, field: &str) -> ServiceResult<i64> {
    match id.parse::<i64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ServiceError::validation(format!(
            "{field} must be a positive integer id, got {:?}",
            id.as_str()
        ))),
    }
}

pub(crate) fn validate_email(email: &str) -> ServiceResult<()> {
    let trimmed = email.trim();
    if trimmed.is_empty() || !trimmed.contains('@') {
        return Err(ServiceError::validation(format!("invalid email {email:?}")));
    }
    Ok(())
}

pub(crate) fn validate_post_body(post: &str) -> ServiceResult<()> {
    if post.trim().is_empty() {
        return Err(ServiceError::validation("post must not be empty"));
    }
    Ok(())
}

/// Run the mutation throttle for the calling client
pub(crate) async fn check_throttle(ctx: &Context<'_>) -> async_graphql::Result<()> {
    let throttle = ctx.data_unchecked::<Arc<dyn Throttle>>();
    let settings = ctx.data_unchecked::<SchemaSettings>();

    throttle
        .check(
            ctx.client_identity(),
            settings.throttle.limit,
            settings.throttle.window,
        )
        .await
        .map_err(|e| e.extend())
}
