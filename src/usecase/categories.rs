use crate::domain::blog::{Category, CategoryUpdate, NewCategory};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const CATEGORIES_PATH: &str = "/blog-categories";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ClientError> {
        self.request(ApiRequest::get(CATEGORIES_PATH).public()).await
    }

    #[tracing::instrument(skip(self), fields(category_id = %id))]
    pub async fn get_category(&self, id: &ResourceId) -> Result<Category, ClientError> {
        self.request(ApiRequest::get(format!("{CATEGORIES_PATH}/{}", id.path_segment())).public())
            .await
    }

    #[tracing::instrument(skip(self, category), fields(name = %category.name))]
    pub async fn create_category(&self, category: &NewCategory) -> Result<Category, ClientError> {
        let request = with_payload(ApiRequest::post(CATEGORIES_PATH), category)?;
        let created: Category = self.request(request).await?;
        tracing::info!(category_id = %created.id, "category created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(category_id = %id))]
    pub async fn update_category(
        &self,
        id: &ResourceId,
        update: &CategoryUpdate,
    ) -> Result<Category, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{CATEGORIES_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(category_id = %id))]
    pub async fn delete_category(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::delete(format!("{CATEGORIES_PATH}/{}", id.path_segment())))
            .await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::domain::session::ACCESS_TOKEN_KEY;
    use crate::repository::memory::MemoryTokenStore;

    use super::*;

    #[tokio::test]
    async fn test_list_categories_is_public() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/blog-categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"id": "c1", "name": "Systems"},
                {"id": "c2", "name": "Web", "description": "Frontend and backend"}
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::new(&ClientConfig::new(server.uri()), MemoryTokenStore::new()).unwrap();
        let categories = client.list_categories().await.unwrap();

        assert_eq!(categories.len(), 2);
        assert_eq!(categories[1].description.as_deref(), Some("Frontend and backend"));
    }

    #[tokio::test]
    async fn test_update_category_rejects_short_name() {
        let server = MockServer::start().await;
        let client = ApiClient::new(&ClientConfig::new(server.uri()), MemoryTokenStore::new()).unwrap();
        let update = CategoryUpdate {
            name: Some(" x ".to_string()),
            ..Default::default()
        };

        let result = client.update_category(&ResourceId::from("c1"), &update).await;
        assert!(matches!(result, Err(ClientError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_category() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/blog-categories"))
            .and(body_json(json!({"name": "Systems"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "c1", "name": "Systems"})))
            .expect(1)
            .mount(&server)
            .await;

        let store = MemoryTokenStore::with_entries([(ACCESS_TOKEN_KEY, "a1")]);
        let client = ApiClient::new(&ClientConfig::new(server.uri()), store).unwrap();
        let created = client
            .create_category(&NewCategory {
                name: "Systems".to_string(),
                description: None,
            })
            .await
            .unwrap();

        assert_eq!(created.id, ResourceId::from("c1"));
    }
}
