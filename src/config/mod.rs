use std::time::Duration;

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_token_store_path")]
    pub token_store_path: String,
    #[serde(default)]
    pub oauth_client_id: Option<String>,
    #[serde(default)]
    pub telemetry_enabled: bool,
    #[serde(default = "default_telemetry_service_name")]
    pub telemetry_service_name: String,
    #[serde(default = "default_telemetry_service_version")]
    pub telemetry_service_version: String,
    #[serde(default = "default_telemetry_environment")]
    pub telemetry_environment: String,
    #[serde(default = "default_telemetry_otlp_endpoint")]
    pub telemetry_otlp_endpoint: String,
}

fn default_api_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_api_prefix() -> String {
    "/api/v1".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_token_store_path() -> String {
    ".lms-client/session.json".to_string()
}

fn default_telemetry_service_name() -> String {
    "lms-client".to_string()
}

fn default_telemetry_service_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_telemetry_environment() -> String {
    "development".to_string()
}

fn default_telemetry_otlp_endpoint() -> String {
    "http://localhost:4317".to_string()
}

impl ClientConfig {
    /// Reads `API_URL`, `API_PREFIX`, `REQUEST_TIMEOUT_SECS`, `TOKEN_STORE_PATH`,
    /// `OAUTH_CLIENT_ID` and the `TELEMETRY_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_environment(Environment::default())
    }

    pub(crate) fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let config: ClientConfig = Config::builder()
            .add_source(environment)
            .build()?
            .try_deserialize()?;

        Ok(config.normalized())
    }

    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_prefix: default_api_prefix(),
            request_timeout_secs: default_request_timeout_secs(),
            token_store_path: default_token_store_path(),
            oauth_client_id: None,
            telemetry_enabled: false,
            telemetry_service_name: default_telemetry_service_name(),
            telemetry_service_version: default_telemetry_service_version(),
            telemetry_environment: default_telemetry_environment(),
            telemetry_otlp_endpoint: default_telemetry_otlp_endpoint(),
        }
        .normalized()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into();
        self.normalized()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_secs = timeout.as_secs().max(1);
        self
    }

    pub fn with_token_store_path(mut self, path: impl Into<String>) -> Self {
        self.token_store_path = path.into();
        self
    }

    /// Absolute root every request path is appended to, without a trailing slash.
    pub fn base_url(&self) -> String {
        format!("{}{}", self.api_url, self.api_prefix)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    fn normalized(mut self) -> Self {
        self.api_url = self.api_url.trim_end_matches('/').to_string();

        let prefix = self.api_prefix.trim_matches('/');
        self.api_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("/{prefix}")
        };

        if self
            .oauth_client_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            self.oauth_client_id = None;
        }

        self
    }
}
