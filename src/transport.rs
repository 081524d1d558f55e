use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::ConnectionConfig;
use crate::errors::ClientError;

/// Authenticated request/response exchange keyed by service path.
///
/// The rest of the library only talks to the server through this trait, so
/// tests can drive controllers against an in-memory implementation.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post_json(&self, path: &str, body: &Value) -> Result<String, ClientError>;

    async fn get_text(&self, path: &str) -> Result<String, ClientError>;
}

/// Production transport over HTTP basic auth.
pub struct HttpTransport {
    client: reqwest::Client,
    config: ConnectionConfig,
}

impl HttpTransport {
    pub fn new(config: ConnectionConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn from_env() -> Result<Self, ClientError> {
        Self::new(ConnectionConfig::from_env()?)
    }

    fn url_for(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    fn check_status(path: &str, status: StatusCode) -> Result<(), ClientError> {
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ClientError::Transport(format!(
                "{} returned HTTP {}",
                path, status
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, path: &str, body: &Value) -> Result<String, ClientError> {
        let response = self
            .client
            .post(self.url_for(path))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "text/plain")
            .json(body)
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Self::check_status(path, response.status())?;

        response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }

    async fn get_text(&self, path: &str) -> Result<String, ClientError> {
        let response = self
            .client
            .get(self.url_for(path))
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))?;

        Self::check_status(path, response.status())?;

        response
            .text()
            .await
            .map_err(|e| ClientError::Transport(e.to_string()))
    }
}
