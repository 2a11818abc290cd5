use super::prelude::*;

#[derive(Default)]
pub struct AuthorQueries;

#[Object]
impl AuthorQueries {
    /// List live authors, optionally filtered and paginated
    async fn authors(
        &self,
        ctx: &Context<'_>,
        filter: Option<AuthorQueryInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<AuthorsPayload> {
        let authors = ctx.data_unchecked::<Arc<dyn AuthorDao>>();
        let settings = ctx.data_unchecked::<SchemaSettings>();

        let page = resolve_pagination(pagination, settings.max_page_size).map_err(|e| e.extend())?;
        let filter = AuthorFilter {
            email: filter
                .and_then(|f| f.email)
                .map(|email| email.trim().to_string()),
        };

        let (records, total) = authors
            .find_all_with_count(&filter, page)
            .await
            .map_err(|e| e.extend())?;

        Ok(AuthorsPayload {
            authors: records.into_iter().map(Author::from).collect(),
            page_info: PageInfo::new(page, total),
        })
    }

    /// Get a live author by ID
    async fn author(&self, ctx: &Context<'_>, id: ID) -> Result<Author> {
        let authors = ctx.data_unchecked::<Arc<dyn AuthorDao>>();
        let author_id = parse_id(&id, "id").map_err(|e| e.extend())?;

        let record = authors.find_by_id(author_id).await.map_err(|e| e.extend())?;

        Ok(Author::from(record))
    }
}
