use super::prelude::*;

#[derive(Default)]
pub struct PostQueries;

#[Object]
impl PostQueries {
    /// List posts, optionally filtered by author and paginated
    async fn posts(
        &self,
        ctx: &Context<'_>,
        filter: Option<PostQueryInput>,
        pagination: Option<PaginationInput>,
    ) -> Result<PostsPayload> {
        let posts = ctx.data_unchecked::<Arc<dyn PostDao>>();
        let settings = ctx.data_unchecked::<SchemaSettings>();

        let page = resolve_pagination(pagination, settings.max_page_size).map_err(|e| e.extend())?;
        let author_id = filter
            .and_then(|f| f.author_id)
            .map(|id| parse_id(&id, "authorId"))
            .transpose()
            .map_err(|e| e.extend())?;

        let (records, total) = posts
            .find_all_with_count(&PostFilter { author_id }, page)
            .await
            .map_err(|e| e.extend())?;

        Ok(PostsPayload {
            posts: records.into_iter().map(Post::from).collect(),
            page_info: PageInfo::new(page, total),
        })
    }

    /// Get a post by ID
    async fn post(&self, ctx: &Context<'_>, id: ID) -> Result<Post> {
        let posts = ctx.data_unchecked::<Arc<dyn PostDao>>();
        let post_id = parse_id(&id, "id").map_err(|e| e.extend())?;

        let record = posts.find_by_id(post_id).await.map_err(|e| e.extend())?;

        Ok(Post::from(record))
    }
}
