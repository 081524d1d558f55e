use url::Url;

use crate::errors::ClientError;

pub const DEFAULT_BASE_URL: &str = "https://feed.luoquant.com";

/// Credentials and endpoint for one authenticated service connection.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    pub username: String,
    pub password: String,
    pub base_url: String,
}

impl ConnectionConfig {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Reads `QES_USERNAME`, `QES_PASSWORD` and optional `QES_URL`,
    /// loading a `.env` file first if one is present.
    pub fn from_env() -> Result<Self, ClientError> {
        dotenvy::dotenv().ok();

        let username = std::env::var("QES_USERNAME")
            .map_err(|_| ClientError::Validation("QES_USERNAME not set".to_string()))?;
        let password = std::env::var("QES_PASSWORD")
            .map_err(|_| ClientError::Validation("QES_PASSWORD not set".to_string()))?;
        let base_url = std::env::var("QES_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Ok(Self {
            username,
            password,
            base_url,
        })
    }

    pub fn validate(&self) -> Result<(), ClientError> {
        if self.username.is_empty() {
            return Err(ClientError::Validation("username is empty".to_string()));
        }
        if self.password.is_empty() {
            return Err(ClientError::Validation("password is empty".to_string()));
        }
        Url::parse(&self.base_url)
            .map_err(|e| ClientError::Validation(format!("invalid base URL {}: {}", self.base_url, e)))?;
        Ok(())
    }
}
