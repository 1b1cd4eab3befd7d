use crate::domain::learning::{Lesson, LessonUpdate, NewLesson};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const LESSONS_PATH: &str = "/lessons";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self), fields(module_id = %module_id))]
    pub async fn list_lessons(&self, module_id: &ResourceId) -> Result<Vec<Lesson>, ClientError> {
        self.request(ApiRequest::get(format!("/modules/{}/lessons", module_id.path_segment())).public())
            .await
    }

    #[tracing::instrument(skip(self), fields(lesson_id = %id))]
    pub async fn get_lesson(&self, id: &ResourceId) -> Result<Lesson, ClientError> {
        self.request(ApiRequest::get(format!("{LESSONS_PATH}/{}", id.path_segment())).public())
            .await
    }

    #[tracing::instrument(skip(self, lesson), fields(module_id = %lesson.module_id))]
    pub async fn create_lesson(&self, lesson: &NewLesson) -> Result<Lesson, ClientError> {
        let request = with_payload(ApiRequest::post(LESSONS_PATH), lesson)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self, update), fields(lesson_id = %id))]
    pub async fn update_lesson(
        &self,
        id: &ResourceId,
        update: &LessonUpdate,
    ) -> Result<Lesson, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{LESSONS_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(lesson_id = %id))]
    pub async fn delete_lesson(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::delete(format!("{LESSONS_PATH}/{}", id.path_segment())))
            .await
    }

    /// Marks the lesson complete for the signed-in user.
    #[tracing::instrument(skip(self), fields(lesson_id = %id))]
    pub async fn complete_lesson(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        let ack = self
            .acknowledge(ApiRequest::post(format!("{LESSONS_PATH}/{}/complete", id.path_segment())))
            .await?;
        tracing::info!("lesson completed");
        Ok(ack)
    }
}
