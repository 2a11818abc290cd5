use tracing::info;

use super::prelude::*;

#[derive(Default)]
pub struct PostMutations;

#[Object]
impl PostMutations {
    /// Create a post for an existing author
    async fn create_post(&self, ctx: &Context<'_>, input: PostCreateInput) -> Result<Post> {
        let posts = ctx.data_unchecked::<Arc<dyn PostDao>>();

        validate_post_body(&input.post).map_err(|e| e.extend())?;
        let author_id = parse_id(&input.author_id, "authorId").map_err(|e| e.extend())?;
        check_throttle(ctx).await?;

        let record = posts
            .create(CreatePost {
                post: input.post,
                author_id,
            })
            .await
            .map_err(|e| e.extend())?;

        info!(post_id = record.id, author_id, "Created post");

        Ok(Post::from(record))
    }

    async fn update_post(&self, ctx: &Context<'_>, input: PostUpdateInput) -> Result<Post> {
        let posts = ctx.data_unchecked::<Arc<dyn PostDao>>();

        let post_id = parse_id(&input.id, "id").map_err(|e| e.extend())?;
        if let Some(body) = &input.post {
            validate_post_body(body).map_err(|e| e.extend())?;
        }
        let author_id = input
            .author_id
            .as_ref()
            .map(|id| parse_id(id, "authorId"))
            .transpose()
            .map_err(|e| e.extend())?;
        check_throttle(ctx).await?;

        let mut record = posts.find_by_id(post_id).await.map_err(|e| e.extend())?;
        if let Some(body) = input.post {
            record.post = body;
        }
        if let Some(author_id) = author_id {
            record.author_id = author_id;
        }

        let record = posts.update(record).await.map_err(|e| e.extend())?;

        info!(post_id = record.id, "Updated post");

        Ok(Post::from(record))
    }

    /// Delete a post permanently
    async fn delete_post(
        &self,
        ctx: &Context<'_>,
        input: PostDeleteInput,
    ) -> Result<PostDeletePayload> {
        let posts = ctx.data_unchecked::<Arc<dyn PostDao>>();

        let post_id = parse_id(&input.id, "id").map_err(|e| e.extend())?;
        check_throttle(ctx).await?;

        posts.delete(post_id).await.map_err(|e| e.extend())?;

        info!(post_id, "Deleted post");

        Ok(PostDeletePayload {
            id: ID::from(post_id.to_string()),
        })
    }
}
