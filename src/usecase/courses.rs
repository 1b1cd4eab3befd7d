use crate::domain::learning::{Course, CourseQuery, CourseUpdate, Enrollment, NewCourse};
use crate::domain::request::ApiRequest;
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const COURSES_PATH: &str = "/courses";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self, query))]
    pub async fn list_courses(&self, query: &CourseQuery) -> Result<Vec<Course>, ClientError> {
        let request = ApiRequest::get(COURSES_PATH)
            .query(query.to_pairs())
            .public();
        let courses: Vec<Course> = self.request(request).await?;
        tracing::debug!(count = courses.len(), "courses listed");
        Ok(courses)
    }

    #[tracing::instrument(skip(self), fields(course_id = %id))]
    pub async fn get_course(&self, id: &ResourceId) -> Result<Course, ClientError> {
        self.request(ApiRequest::get(format!("{COURSES_PATH}/{}", id.path_segment())).public())
            .await
    }

    /// Courses authored by the signed-in instructor.
    #[tracing::instrument(skip(self))]
    pub async fn my_courses(&self) -> Result<Vec<Course>, ClientError> {
        self.request(ApiRequest::get(format!("{COURSES_PATH}/my-courses")))
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn enrolled_courses(&self) -> Result<Vec<Course>, ClientError> {
        self.request(ApiRequest::get(format!("{COURSES_PATH}/enrolled")))
            .await
    }

    #[tracing::instrument(skip(self, course), fields(title = %course.title))]
    pub async fn create_course(&self, course: &NewCourse) -> Result<Course, ClientError> {
        let request = with_payload(ApiRequest::post(COURSES_PATH), course)?;
        let created: Course = self.request(request).await?;
        tracing::info!(course_id = %created.id, "course created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(course_id = %id))]
    pub async fn update_course(
        &self,
        id: &ResourceId,
        update: &CourseUpdate,
    ) -> Result<Course, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{COURSES_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    #[tracing::instrument(skip(self), fields(course_id = %id))]
    pub async fn delete_course(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        let ack = self
            .acknowledge(ApiRequest::delete(format!("{COURSES_PATH}/{}", id.path_segment())))
            .await?;
        tracing::info!("course deleted");
        Ok(ack)
    }

    #[tracing::instrument(skip(self), fields(course_id = %id))]
    pub async fn publish_course(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::post(format!("{COURSES_PATH}/{}/publish", id.path_segment())))
            .await
    }

    #[tracing::instrument(skip(self), fields(course_id = %id))]
    pub async fn unpublish_course(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::post(format!("{COURSES_PATH}/{}/unpublish", id.path_segment())))
            .await
    }

    /// Enrolls the signed-in user.
    #[tracing::instrument(skip(self), fields(course_id = %course_id))]
    pub async fn enroll(&self, course_id: &ResourceId) -> Result<Enrollment, ClientError> {
        let enrollment: Enrollment = self
            .request(ApiRequest::post(format!("{COURSES_PATH}/{}/enroll", course_id.path_segment())))
            .await?;
        tracing::info!("enrolled in course");
        Ok(enrollment)
    }

    #[tracing::instrument(skip(self), fields(course_id = %course_id))]
    pub async fn unenroll(&self, course_id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::delete(format!("{COURSES_PATH}/{}/enroll", course_id.path_segment())))
            .await
    }

    #[tracing::instrument(skip(self), fields(course_id = %course_id))]
    pub async fn course_enrollments(
        &self,
        course_id: &ResourceId,
    ) -> Result<Vec<Enrollment>, ClientError> {
        self.request(ApiRequest::get(format!("{COURSES_PATH}/{}/enrollments", course_id.path_segment())))
            .await
    }
}
