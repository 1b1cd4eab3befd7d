use reqwest::{Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::config::ClientConfig;
use crate::domain::Acknowledgement;
use crate::domain::file::FileUpload;
use crate::domain::request::{ApiRequest, RequestBody};
use crate::domain::session::{RefreshRequest, Session, TokenPair};
use crate::repository::file::FileTokenStore;
use crate::usecase::contracts::TokenStore;
use crate::usecase::error::{ClientError, extract_detail};
use crate::usecase::session::SessionManager;

pub(crate) const REFRESH_PATH: &str = "/auth/refresh";

/// HTTP client for the LMS API. Attaches the held bearer token, refreshes it
/// once on an auth challenge, and degrades gracefully on public endpoints.
pub struct ApiClient<S>
where
    S: TokenStore,
{
    http: reqwest::Client,
    base_url: String,
    session: SessionManager<S>,
    oauth_client_id: Option<String>,
}

impl ApiClient<FileTokenStore> {
    /// Client persisting its session at `config.token_store_path`.
    pub fn from_config(config: &ClientConfig) -> Result<Self, ClientError> {
        Self::new(config, FileTokenStore::new(&config.token_store_path))
    }
}

impl<S> ApiClient<S>
where
    S: TokenStore,
{
    pub fn new(config: &ClientConfig, store: S) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("lms-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ClientError::Network(e.to_string()))?;

        let base_url = config.base_url();
        tracing::info!(%base_url, timeout_secs = config.request_timeout_secs, "API client created");

        Ok(Self {
            http,
            base_url,
            session: SessionManager::load(store),
            oauth_client_id: config.oauth_client_id.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn oauth_client_id(&self) -> Option<&str> {
        self.oauth_client_id.as_deref()
    }

    pub fn session_manager(&self) -> &SessionManager<S> {
        &self.session
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.current().await
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.is_authenticated().await
    }

    /// Core request primitive every accessor funnels through.
    ///
    /// A 401/403 on a protected request triggers at most one refresh and one
    /// retry; if either fails the session is cleared and `SessionExpired` is
    /// returned. A 401/403 on a public request clears stale tokens and still
    /// tries to decode the body.
    #[tracing::instrument(
        skip(self, request),
        fields(method = %request.method, path = %request.path, requires_auth = request.requires_auth)
    )]
    pub async fn request<T>(&self, request: ApiRequest) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
    {
        let (response, sent_token) = self.dispatch(&request).await?;
        let status = response.status();

        if !is_auth_challenge(status) {
            return decode(response).await;
        }

        if !request.requires_auth {
            tracing::warn!(%status, "auth challenge on public endpoint");
            if self.session.clear_if_current(sent_token.as_deref()).await {
                tracing::info!("dropped stale tokens");
            } else {
                tracing::debug!("session changed since the request was sent, keeping it");
            }
            return decode_degraded(response).await;
        }

        tracing::warn!(%status, "auth challenge on protected endpoint");
        if let Err(e) = self.refresh_session(sent_token.as_deref()).await {
            tracing::warn!(error = %e, "token refresh failed");
            return Err(self.expire().await);
        }

        let (retried, _) = self.dispatch(&request).await?;
        if is_auth_challenge(retried.status()) {
            tracing::warn!(status = %retried.status(), "still unauthorized after refresh");
            return Err(self.expire().await);
        }

        decode(retried).await
    }

    /// `request` for action endpoints that answer with a message or nothing at all.
    pub(crate) async fn acknowledge(&self, request: ApiRequest) -> Result<Acknowledgement, ClientError> {
        let ack: Option<Acknowledgement> = self.request(request).await?;
        Ok(ack.unwrap_or_default())
    }

    /// Sends with the currently held token and reports which token was used.
    async fn dispatch(
        &self,
        request: &ApiRequest,
    ) -> Result<(Response, Option<String>), ClientError> {
        let token = self.session.access_token().await;
        let response = self.send(request, token.as_deref()).await?;
        Ok((response, token))
    }

    pub(crate) async fn send(
        &self,
        request: &ApiRequest,
        bearer: Option<&str>,
    ) -> Result<Response, ClientError> {
        let url = request.url(&self.base_url);
        let mut builder = self.http.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(token) = bearer {
            builder = builder.bearer_auth(token);
        }

        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
            RequestBody::Upload(file) => builder.multipart(multipart_form(file)?),
        };

        tracing::debug!(%url, "sending request");
        let response = builder.send().await.map_err(|e| {
            let e = e.without_url();
            tracing::warn!(%url, error = %e, timeout = e.is_timeout(), "request failed before a response");
            ClientError::from_transport(e)
        })?;

        let status = response.status();
        metrics::counter!(
            "lms_client_requests_total",
            "method" => request.method.to_string(),
            "status" => status.as_u16().to_string()
        )
        .increment(1);
        tracing::debug!(%status, "response received");

        Ok(response)
    }

    /// Refreshes the access token unless another task already did so since
    /// `stale_token` was sent. Refreshes are serialized by the session's refresh lock.
    async fn refresh_session(&self, stale_token: Option<&str>) -> Result<(), ClientError> {
        let _guard = self.session.lock_refresh().await;

        let Some(current) = self.session.current().await else {
            return Err(ClientError::SessionExpired);
        };
        if stale_token != Some(current.access_token.as_str()) {
            tracing::debug!("token already rotated by a concurrent request");
            return Ok(());
        }
        let Some(refresh_token) = current.refresh_token else {
            tracing::debug!("no refresh token held");
            return Err(ClientError::SessionExpired);
        };

        let request = ApiRequest::post(REFRESH_PATH)
            .json(&RefreshRequest {
                refresh_token: &refresh_token,
            })
            .map_err(ClientError::encode)?
            .public();

        let outcome: Result<Session, ClientError> = async {
            let response = self.send(&request, None).await?;
            let pair: TokenPair = decode(response).await?;
            self.session
                .rotate(pair)
                .await?
                .ok_or(ClientError::SessionExpired)
        }
        .await;

        match outcome {
            Ok(_) => {
                metrics::counter!("lms_client_token_refresh_total", "outcome" => "success").increment(1);
                tracing::info!("access token refreshed");
                Ok(())
            }
            Err(e) => {
                metrics::counter!("lms_client_token_refresh_total", "outcome" => "failure").increment(1);
                Err(e)
            }
        }
    }

    async fn expire(&self) -> ClientError {
        self.session.clear().await;
        metrics::counter!("lms_client_session_expired_total").increment(1);
        ClientError::SessionExpired
    }
}

/// Validates `payload` and attaches it as the JSON body.
pub(crate) fn with_payload<B>(request: ApiRequest, payload: &B) -> Result<ApiRequest, ClientError>
where
    B: Serialize + Validate,
{
    payload.validate()?;
    request.json(payload).map_err(ClientError::encode)
}

fn is_auth_challenge(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn multipart_form(file: &FileUpload) -> Result<reqwest::multipart::Form, ClientError> {
    let mut part =
        reqwest::multipart::Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
    if let Some(content_type) = &file.content_type {
        part = part
            .mime_str(content_type)
            .map_err(|e| ClientError::Validation(format!("invalid content type: {e}")))?;
    }

    Ok(reqwest::multipart::Form::new()
        .part("file", part)
        .text("file_type", file.kind.as_str()))
}

pub(crate) async fn read_text(response: Response) -> Result<(StatusCode, String), ClientError> {
    let status = response.status();
    let body = response.text().await.map_err(ClientError::from_transport)?;
    Ok((status, body))
}

/// Empty bodies decode as JSON `null`, so `()` and `Option<T>` accept a 204.
pub(crate) fn parse_body<T>(body: &str) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let raw = if body.trim().is_empty() { "null" } else { body };
    serde_json::from_str(raw).map_err(|e| {
        tracing::warn!(error = %e, "failed to parse response body");
        ClientError::MalformedResponse(e.to_string())
    })
}

async fn decode<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let (status, body) = read_text(response).await?;
    if !status.is_success() {
        let detail = extract_detail(status.as_u16(), &body);
        tracing::debug!(%status, %detail, "request rejected");
        return Err(ClientError::RequestFailed {
            status: status.as_u16(),
            detail,
        });
    }
    parse_body(&body)
}

async fn decode_degraded<T>(response: Response) -> Result<T, ClientError>
where
    T: DeserializeOwned,
{
    let (status, body) = read_text(response).await?;
    parse_body(&body).map_err(|_| {
        ClientError::ResourceUnavailable(extract_detail(status.as_u16(), &body))
    })
}
