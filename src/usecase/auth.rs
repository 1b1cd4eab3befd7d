use serde::Serialize;
use validator::Validate;

use crate::domain::Acknowledgement;
use crate::domain::request::ApiRequest;
use crate::domain::session::TokenPair;
use crate::domain::user::{NewUser, User};
use crate::usecase::client::{ApiClient, parse_body, read_text};
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::{ClientError, extract_detail};

const LOGIN_PATH: &str = "/auth/login";
const REGISTER_PATH: &str = "/auth/register";
const ME_PATH: &str = "/auth/me";
const CHANGE_PASSWORD_PATH: &str = "/auth/change-password";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Serialize)]
struct ForgotPassword<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct ResetPassword<'a> {
    token: &'a str,
    new_password: &'a str,
}

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    /// Exchanges credentials for a token pair and returns the signed-in user.
    /// A rejected exchange is never retried and leaves any held session alone.
    #[tracing::instrument(skip(self, secret), fields(identifier = %identifier))]
    pub async fn login(&self, identifier: &str, secret: &str) -> Result<User, ClientError> {
        tracing::debug!("logging in");

        let request = ApiRequest::post(LOGIN_PATH)
            .form(vec![
                ("username".to_string(), identifier.to_string()),
                ("password".to_string(), secret.to_string()),
            ])
            .public();

        let response = self.send(&request, None).await?;
        let (status, body) = read_text(response).await?;

        if !status.is_success() {
            let detail = extract_detail(status.as_u16(), &body);
            tracing::warn!(%status, %detail, "login rejected");
            return match status.as_u16() {
                400 | 401 | 403 | 422 => Err(ClientError::InvalidCredentials(detail)),
                code => Err(ClientError::RequestFailed {
                    status: code,
                    detail,
                }),
            };
        }

        let pair: TokenPair = parse_body(&body)?;
        self.session_manager().establish(pair).await?;
        tracing::info!("logged in");

        self.current_user().await
    }

    /// Creates an account. Backend rejections are surfaced verbatim.
    #[tracing::instrument(skip(self, new_user), fields(email = %new_user.email, username = %new_user.username))]
    pub async fn register(&self, new_user: &NewUser) -> Result<User, ClientError> {
        new_user.validate()?;

        let request = ApiRequest::post(REGISTER_PATH)
            .json(new_user)
            .map_err(ClientError::encode)?
            .public();

        let response = self.send(&request, None).await?;
        let (status, body) = read_text(response).await?;

        if !status.is_success() {
            let detail = extract_detail(status.as_u16(), &body);
            tracing::warn!(%status, %detail, "registration rejected");
            return Err(ClientError::Registration(detail));
        }

        let user: User = parse_body(&body)?;
        tracing::info!(user_id = %user.id, "account registered");
        Ok(user)
    }

    pub async fn register_then_login(&self, new_user: &NewUser) -> Result<User, ClientError> {
        self.register(new_user).await?;
        self.login(&new_user.email, &new_user.password).await
    }

    /// Drops both tokens from memory and the durable store. Never fails.
    #[tracing::instrument(skip(self))]
    pub async fn logout(&self) {
        self.session_manager().clear().await;
        tracing::info!("logged out");
    }

    #[tracing::instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, ClientError> {
        self.request(ApiRequest::get(ME_PATH)).await
    }

    #[tracing::instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ClientError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let request = ApiRequest::post(CHANGE_PASSWORD_PATH).query(vec![
            ("current_password".to_string(), current_password.to_string()),
            ("new_password".to_string(), new_password.to_string()),
        ]);
        self.request(request).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> Result<Acknowledgement, ClientError> {
        let request = ApiRequest::post(FORGOT_PASSWORD_PATH)
            .json(&ForgotPassword { email })
            .map_err(ClientError::encode)?
            .public();
        self.request(request).await
    }

    #[tracing::instrument(skip(self, token, new_password))]
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<Acknowledgement, ClientError> {
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ClientError::Validation(format!(
                "password must be at least {MIN_PASSWORD_LEN} characters long"
            )));
        }

        let request = ApiRequest::post(RESET_PASSWORD_PATH)
            .json(&ResetPassword {
                token,
                new_password,
            })
            .map_err(ClientError::encode)?
            .public();
        self.request(request).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::ClientConfig;
    use crate::domain::session::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};
    use crate::repository::memory::MemoryTokenStore;

    use super::*;

    fn client_with(server: &MockServer, tokens: &[(&str, &str)]) -> ApiClient<MemoryTokenStore> {
        let store = MemoryTokenStore::with_entries(tokens.iter().copied());
        ApiClient::new(&ClientConfig::new(server.uri()), store).unwrap()
    }

    fn user_json() -> serde_json::Value {
        json!({
            "id": 7,
            "email": "ada@example.com",
            "username": "ada",
            "full_name": "Ada Lovelace",
            "role": "user",
            "is_active": true
        })
    }

    #[tokio::test]
    async fn test_login_persists_tokens_and_fetches_profile() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .and(header("content-type", "application/x-www-form-urlencoded"))
            .and(body_string_contains("username=ada%40example.com"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "a1",
                "refresh_token": "r1",
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("authorization", "Bearer a1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[]);
        let user = client.login("ada@example.com", "secret1").await.unwrap();

        assert_eq!(user.username.as_deref(), Some("ada"));
        let store = client.session_manager().store();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a1"));
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
    }

    #[tokio::test]
    async fn test_bad_login_is_invalid_credentials_every_time() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(json!({"detail": "Incorrect username or password"})),
            )
            .expect(2)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/refresh"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_with(&server, &[]);

        for _ in 0..2 {
            match client.login("bad@x.com", "wrong").await {
                Err(ClientError::InvalidCredentials(detail)) => {
                    assert_eq!(detail, "Incorrect username or password")
                }
                other => panic!("unexpected result {other:?}"),
            }
        }
        assert!(!client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_bad_login_keeps_existing_session() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = client_with(&server, &[(ACCESS_TOKEN_KEY, "a0"), (REFRESH_TOKEN_KEY, "r0")]);
        assert!(client.login("bad@x.com", "wrong").await.is_err());

        assert_eq!(client.session().await.unwrap().access_token, "a0");
    }

    #[tokio::test]
    async fn test_registration_conflict_is_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/register"))
            .respond_with(
                ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[]);
        let new_user = NewUser::new("ada@example.com", "ada", "Ada Lovelace", "secret1");

        match client.register_then_login(&new_user).await {
            Err(e @ ClientError::Registration(_)) => assert_eq!(e.to_string(), "Email already registered"),
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/register"))
            .and(body_json(json!({
                "email": "ada@example.com",
                "username": "ada",
                "full_name": "Ada Lovelace",
                "password": "secret1",
                "role": "user"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(user_json()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "a1"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[]);
        let new_user = NewUser::new("ada@example.com", "ada", "Ada Lovelace", "secret1");
        let user = client.register_then_login(&new_user).await.unwrap();

        assert_eq!(user.email, "ada@example.com");
        assert!(client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_register_validates_before_sending() {
        let server = MockServer::start().await;
        let client = client_with(&server, &[]);
        let new_user = NewUser::new("not-an-email", "ada", "Ada", "123");

        assert!(matches!(
            client.register(&new_user).await,
            Err(ClientError::Validation(_))
        ));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_current_user_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/auth/me"))
            .and(header("authorization", "Bearer valid"))
            .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[(ACCESS_TOKEN_KEY, "valid")]);
        let user = client.current_user().await.unwrap();

        assert_eq!(user.full_name.as_deref(), Some("Ada Lovelace"));
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let server = MockServer::start().await;
        let client = client_with(&server, &[(ACCESS_TOKEN_KEY, "a1"), (REFRESH_TOKEN_KEY, "r1")]);

        client.logout().await;
        client.logout().await;

        assert!(!client.is_authenticated().await);
        assert_eq!(client.session_manager().store().get(REFRESH_TOKEN_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_change_password_uses_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/change-password"))
            .and(query_param("current_password", "old-one"))
            .and(query_param("new_password", "new-one"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"message": "Password changed successfully"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[(ACCESS_TOKEN_KEY, "a1")]);
        let ack = client.change_password("old-one", "new-one").await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("Password changed successfully"));

        assert!(matches!(
            client.change_password("old-one", "short").await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_change_password_transport_error_hides_passwords() {
        let addr = std::net::TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let config = ClientConfig::new(format!("http://{addr}"));
        let store = MemoryTokenStore::with_entries([(ACCESS_TOKEN_KEY, "a1")]);
        let client = ApiClient::new(&config, store).unwrap();

        let result = client.change_password("OldSecret99", "NewSecret99").await;

        match result {
            Err(ClientError::Network(message)) => {
                assert!(!message.contains("OldSecret99"));
                assert!(!message.contains("NewSecret99"));
                assert!(!message.contains("change-password"));
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert!(client.is_authenticated().await);
    }

    #[tokio::test]
    async fn test_forgot_password_is_public() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/forgot-password"))
            .and(body_json(json!({"email": "ada@example.com"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "sent"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_with(&server, &[]);
        let ack = client.forgot_password("ada@example.com").await.unwrap();
        assert_eq!(ack.message.as_deref(), Some("sent"));
    }
}
