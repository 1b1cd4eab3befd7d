use crate::domain::request::ApiRequest;
use crate::domain::user::{NewUser, User, UserQuery, UserRole, UserUpdate};
use crate::domain::{Acknowledgement, ResourceId};
use crate::usecase::client::{ApiClient, with_payload};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::ClientError;

const USERS_PATH: &str = "/users";

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    #[tracing::instrument(skip(self, query))]
    pub async fn list_users(&self, query: &UserQuery) -> Result<Vec<User>, ClientError> {
        let request = ApiRequest::get(USERS_PATH).query(query.to_pairs());
        let users: Vec<User> = self.request(request).await?;
        tracing::debug!(count = users.len(), "users listed");
        Ok(users)
    }

    #[tracing::instrument(skip(self), fields(user_id = %id))]
    pub async fn get_user(&self, id: &ResourceId) -> Result<User, ClientError> {
        self.request(ApiRequest::get(format!("{USERS_PATH}/{}", id.path_segment())))
            .await
    }

    /// Admin-side account creation. Unlike `register`, failures map like any
    /// other protected request.
    #[tracing::instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn create_user(&self, new_user: &NewUser) -> Result<User, ClientError> {
        let request = with_payload(ApiRequest::post(USERS_PATH), new_user)?;
        let created: User = self.request(request).await?;
        tracing::info!(user_id = %created.id, "user created");
        Ok(created)
    }

    #[tracing::instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_user(&self, id: &ResourceId, update: &UserUpdate) -> Result<User, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{USERS_PATH}/{}", id.path_segment())), update)?;
        self.request(request).await
    }

    /// Soft delete: the backend deactivates rather than removes the account.
    #[tracing::instrument(skip(self), fields(user_id = %id))]
    pub async fn deactivate_user(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        let ack = self
            .acknowledge(ApiRequest::delete(format!("{USERS_PATH}/{}", id.path_segment())))
            .await?;
        tracing::info!("user deactivated");
        Ok(ack)
    }

    #[tracing::instrument(skip(self), fields(user_id = %id))]
    pub async fn activate_user(&self, id: &ResourceId) -> Result<Acknowledgement, ClientError> {
        self.acknowledge(ApiRequest::post(format!("{USERS_PATH}/{}/activate", id.path_segment())))
            .await
    }

    #[tracing::instrument(skip(self), fields(user_id = %id, role = role.as_str()))]
    pub async fn change_user_role(
        &self,
        id: &ResourceId,
        role: UserRole,
    ) -> Result<Acknowledgement, ClientError> {
        if !matches!(role, UserRole::Admin | UserRole::User) {
            return Err(ClientError::Validation(
                "role must be either 'admin' or 'user'".to_string(),
            ));
        }

        let request = ApiRequest::post(format!("{USERS_PATH}/{}/change-role", id.path_segment()))
            .query(vec![("new_role".to_string(), role.as_str().to_string())]);
        self.acknowledge(request).await
    }

    /// Updates the signed-in user's own profile.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, ClientError> {
        let request = with_payload(ApiRequest::put(format!("{USERS_PATH}/me")), update)?;
        self.request(request).await
    }
}
