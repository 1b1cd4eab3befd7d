use crate::domain::learning::{Enrollment, NewEnrollment};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const ENROLLMENTS_PATH: &str = "/enrollments";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    /// Admin enrollment of an arbitrary user.
    #[tracing::instrument(skip(self, enrollment), fields(user_id = %enrollment.user_id, course_id = %enrollment.course_id))]
    pub async fn create_enrollment(
        &self,
        enrollment: &NewEnrollment,
    ) -> Result<Enrollment, ClientError> {
        let request = with_payload(ApiRequest::post(ENROLLMENTS_PATH), enrollment)?;
        let created: Enrollment = self.request(request).await?;
        tracing::info!("enrollment created");
        Ok(created)
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id, course_id = %course_id))]
    pub async fn delete_enrollment(
        &self,
        user_id: &ResourceId,
        course_id: &ResourceId,
    ) -> Result<Acknowledgement, ClientError> {
        let path = format!(
            "{ENROLLMENTS_PATH}/{}/{}",
            user_id.path_segment(),
            course_id.path_segment()
        );
        self.acknowledge(ApiRequest::delete(path)).await
    }

    #[tracing::instrument(skip(self), fields(user_id = %user_id))]
    pub async fn user_enrollments(&self, user_id: &ResourceId) -> Result<Vec<Enrollment>, ClientError> {
        self.request(ApiRequest::get(format!("{ENROLLMENTS_PATH}/user/{}", user_id.path_segment())))
            .await
    }

    #[tracing::instrument(skip(self), fields(course_id = %course_id))]
    pub async fn course_enrollments_admin(
        &self,
        course_id: &ResourceId,
    ) -> Result<Vec<Enrollment>, ClientError> {
        self.request(ApiRequest::get(format!("{ENROLLMENTS_PATH}/course/{}", course_id.path_segment())))
            .await
    }
}
