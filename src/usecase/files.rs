use crate::domain::file::{FileUpload, UploadResponse};
use crate::domain::request::ApiRequest;
use crate::usecase::client::ApiClient;
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const UPLOAD_PATH: &str = "/files/upload";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    /// Uploads as multipart `file` + `file_type`; returns where the backend stored it.
    #[tracing::instrument(skip(self, file), fields(file_name = %file.file_name, size = file.bytes.len(), kind = file.kind.as_str()))]
    pub async fn upload_file(&self, file: FileUpload) -> Result<UploadResponse, ClientError> {
        if file.file_name.trim().is_empty() {
            return Err(ClientError::Validation("file name must not be empty".to_string()));
        }

        let response: UploadResponse = self.request(ApiRequest::post(UPLOAD_PATH).upload(file)).await?;
        tracing::info!(url = %response.file_info.url, "file uploaded");
        Ok(response)
    }
}
