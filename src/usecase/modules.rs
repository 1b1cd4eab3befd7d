use crate::domain::learning::{Module, ModuleUpdate, NewModule};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const MODULES_PATH: &str = "/modules";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self), fields(course_id = %course_id))]
    pub async fn list_modules(&self, course_id: &ResourceId) -> Result<Vec<Module>, ClientError> {
        let request = ApiRequest::get(MODULES_PATH)
            .query(vec![("course_id".to_string(), course_id.to_string())])
            .public();
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(module_id = %id))]
    pub async fn get_module(&self, id: &ResourceId) -> Result<Module, ClientError> {
        self.request(ApiRequest::get(format!("{MODULES_PATH}/{}", id.path_segment())).public())
            .await
    }

    #[tracing::instrument(skip(self, module), fields(course_id = %module.course_id))]
    pub async fn create_module(&self, module: &NewModule) -> Result<Module, ClientError> {
        let request = with_payload(ApiRequest::post(MODULES_PATH), module)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self, update), fields(module_id = %id))]
    pub async fn update_module(
        &self,
        id: &ResourceId,
        update: &ModuleUpdate,
    ) -> Result<Module, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{MODULES_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(module_id = %id))]
    pub async fn delete_module(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::delete(format!("{MODULES_PATH}/{}", id.path_segment())))
            .await
    }
}
