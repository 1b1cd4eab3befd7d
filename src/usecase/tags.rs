use crate::domain::blog::{NewTag, Tag, TagUpdate};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const TAGS_PATH: &str = "/blog-tags";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self))]
    pub async fn list_tags(&self) -> Result<Vec<Tag>, ClientError> {
        self.request(ApiRequest::get(TAGS_PATH).public()).await
    }

    /// Tags ordered by how many posts use them.
    #[tracing::instrument(skip(self))]
    pub async fn popular_tags(&self, limit: u32) -> Result<Vec<Tag>, ClientError> {
        let request = ApiRequest::get(format!("{TAGS_PATH}/popular"))
            .query(vec![("limit".to_string(), limit.to_string())])
            .public();
        self.request(request).await
    }

    #[tracing::instrument(skip(self, tag), fields(name = %tag.name))]
    pub async fn create_tag(&self, tag: &NewTag) -> Result<Tag, ClientError> {
        let request = with_payload(ApiRequest::post(TAGS_PATH), tag)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self, update), fields(tag_id = %id))]
    pub async fn update_tag(&self, id: &ResourceId, update: &TagUpdate) -> Result<Tag, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{TAGS_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(tag_id = %id))]
    pub async fn delete_tag(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::delete(format!("{TAGS_PATH}/{}", id.path_segment())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::domain::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use crate::repository::memory::MemoryTokenStore;

    use super::*;

    #[tokio::test]
    async fn test_popular_tags_passes_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blog-tags/popular"))
            .and(query_param("limit", "5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "t1", "name": "rust"}])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(server.uri()), MemoryTokenStore::new()).unwrap();
        let tags = client.popular_tags(5).await.unwrap();

        assert_eq!(tags[0].name, "rust");
    }

    #[tokio::test]
    async fn test_delete_tag_with_revoked_session_expires() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/v1/blog-tags/t1"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({"detail": "Not enough permissions"})))
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a2"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryTokenStore::with_entries([(ACCESS_TOKEN_KEY, "a1"), (REFRESH_TOKEN_KEY, "r1")]);
        let client = ApiClient::new(&ClientConfig::new(server.uri()), store).unwrap();

        let result = client.delete_tag(&ResourceId::from("t1")).await;
        assert!(matches!(result, Err(ClientError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_create_tag_rejects_short_name() {
        let server = MockServer::start().await;
        let client = ApiClient::new(&ClientConfig::new(server.uri()), MemoryTokenStore::new()).unwrap();

        let result = client.create_tag(&NewTag { name: "a".to_string() }).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }
}
