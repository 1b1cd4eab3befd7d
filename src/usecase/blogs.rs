use crate::domain::blog::{BlogPost, BlogPostUpdate, BlogQuery, NewBlogPost};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const BLOGS_PATH: &str = "/blogs";

fn limit_pair(limit: u32) -> Vec<(String, String)> {
    vec![("limit".to_string(), limit.to_string())]
}

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self, query))]
    pub async fn list_blog_posts(&self, query: &BlogQuery) -> Result<Vec<BlogPost>, ClientError> {
        let request = ApiRequest::get(BLOGS_PATH).query(query.to_pairs()).public();
        let posts: Vec<BlogPost> = self.request(request).await?;
        tracing::debug!(count = posts.len(), "blog posts listed");
        Ok(posts)
    }

    #[tracing::instrument(skip(self))]
    pub async fn popular_blog_posts(&self, limit: u32) -> Result<Vec<BlogPost>, ClientError> {
        let request = ApiRequest::get(format!("{BLOGS_PATH}/popular"))
            .query(limit_pair(limit))
            .public();
        self.request(request).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn recent_blog_posts(&self, limit: u32) -> Result<Vec<BlogPost>, ClientError> {
        let request = ApiRequest::get(format!("{BLOGS_PATH}/recent"))
            .query(limit_pair(limit))
            .public();
        self.request(request).await
    }

    /// Posts written by the signed-in user, drafts included.
    #[tracing::instrument(skip(self))]
    pub async fn my_blog_posts(&self, skip: u32, limit: u32) -> Result<Vec<BlogPost>, ClientError> {
        let request = ApiRequest::get(format!("{BLOGS_PATH}/my-posts"))
            .query(BlogQuery::page(skip, limit).to_pairs());
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(post_id = %id))]
    pub async fn get_blog_post(&self, id: &ResourceId) -> Result<BlogPost, ClientError> {
        self.request(ApiRequest::get(format!("{BLOGS_PATH}/{}", id.path_segment())).public())
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_blog_post_by_slug(&self, slug: &str) -> Result<BlogPost, ClientError> {
        let path = format!("{BLOGS_PATH}/slug/{}", urlencoding::encode(slug));
        self.request(ApiRequest::get(path).public()).await
    }

    #[tracing::instrument(skip(self, post), fields(title = %post.title))]
    pub async fn create_blog_post(&self, post: &NewBlogPost) -> Result<BlogPost, ClientError> {
        let request = with_payload(ApiRequest::post(BLOGS_PATH), post)?;
        let created: BlogPost = self.request(request).await?;
        tracing::info!(post_id = %created.id, "blog post created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(post_id = %id))]
    pub async fn update_blog_post(
        &self,
        id: &ResourceId,
        update: &BlogPostUpdate,
    ) -> Result<BlogPost, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{BLOGS_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(post_id = %id))]
    pub async fn delete_blog_post(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        let ack = self
            .acknowledge(ApiRequest::delete(format!("{BLOGS_PATH}/{}", id.path_segment())))
            .await?;
        tracing::info!("blog post deleted");
        Ok(ack)
    }

    #[tracing::instrument(skip(self), fields(post_id = %id))]
    pub async fn publish_blog_post(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::post(format!("{BLOGS_PATH}/{}/publish", id.path_segment())))
            .await
    }

    #[tracing::instrument(skip(self), fields(post_id = %id))]
    pub async fn unpublish_blog_post(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::post(format!("{BLOGS_PATH}/{}/unpublish", id.path_segment())))
            .await
    }
}
