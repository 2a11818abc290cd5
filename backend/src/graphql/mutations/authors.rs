use async_graphql::MaybeUndefined;
use tracing::info;

use super::prelude::*;

#[derive(Default)]
pub struct AuthorMutations;

fn overlay(current: Option<String>, update: MaybeUndefined<String>) -> Option<String> {
    match update {
        MaybeUndefined::Undefined => current,
        MaybeUndefined::Null => None,
        MaybeUndefined::Value(value) => Some(value),
    }
}

#[Object]
impl AuthorMutations {
    /// Register a new author
    async fn create_author(&self, ctx: &Context<'_>, input: AuthorCreateInput) -> Result<Author> {
        let authors = ctx.data_unchecked::<Arc<dyn AuthorDao>>();

        validate_email(&input.email).map_err(|e| e.extend())?;
        check_throttle(ctx).await?;

        let record = authors
            .create(CreateAuthor {
                email: input.email.trim().to_string(),
                first_name: input.first_name,
                last_name: input.last_name,
            })
            .await
            .map_err(|e| e.extend())?;

        info!(author_id = record.id, "Created author");

        Ok(Author::from(record))
    }

    /// Update an author. Omitted fields are left unchanged.
    async fn update_author(&self, ctx: &Context<'_>, input: AuthorUpdateInput) -> Result<Author> {
        let authors = ctx.data_unchecked::<Arc<dyn AuthorDao>>();

        let author_id = parse_id(&input.id, "id").map_err(|e| e.extend())?;
        if let Some(email) = &input.email {
            validate_email(email).map_err(|e| e.extend())?;
        }
        check_throttle(ctx).await?;

        let mut record = authors.find_by_id(author_id).await.map_err(|e| e.extend())?;
        if let Some(email) = input.email {
            record.email = email.trim().to_string();
        }
        record.first_name = overlay(record.first_name, input.first_name);
        record.last_name = overlay(record.last_name, input.last_name);

        let record = authors.update(record).await.map_err(|e| e.extend())?;

        info!(author_id = record.id, "Updated author");

        Ok(Author::from(record))
    }

    /// Soft-delete an author. The row is kept but hidden from every read.
    async fn delete_author(
        &self,
        ctx: &Context<'_>,
        input: AuthorDeleteInput,
    ) -> Result<AuthorDeletePayload> {
        let authors = ctx.data_unchecked::<Arc<dyn AuthorDao>>();

        let author_id = parse_id(&input.id, "id").map_err(|e| e.extend())?;
        check_throttle(ctx).await?;

        authors.delete(author_id).await.map_err(|e| e.extend())?;

        info!(author_id, "Deleted author");

        Ok(AuthorDeletePayload {
            id: ID::from(author_id.to_string()),
        })
    }
}
