//! HTTP client for the remote records API.

use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::config::ConsoleConfig;
use crate::models::*;

/// HTTP client errors. Any of them is a failed remote request.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Server error: {0}")]
    Server(String),
}

/// HTTP client for the records API.
#[derive(Debug, Clone)]
pub struct AgentaClient {
    base_url: String,
    client: Client,
}

impl AgentaClient {
    /// Create client from console configuration.
    pub fn from_config(config: &ConsoleConfig) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self::with_client(config.base_url(), client))
    }

    /// Create with an explicit base URL and default client settings.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        tracing::debug!("{} {}", method, url);
        self.client.request(method, &url)
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<T, ClientError> {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// Like `send`, for calls whose response body is not interpreted.
    async fn send_empty(
        &self,
        method: Method,
        path: &str,
        body: Option<&impl Serialize>,
    ) -> Result<(), ClientError> {
        let mut req = self.request(method, path);
        if let Some(body) = body {
            req = req.json(body);
        }
        let response = req.send().await?;
        check_status(response).await?;
        Ok(())
    }

    // ============================================================
    // Record Operations
    // ============================================================

    /// List all records.
    pub async fn list_records(&self) -> Result<Vec<Record>, ClientError> {
        let envelope: Envelope<Vec<Record>> =
            self.send(Method::GET, "/records", None::<&()>).await?;
        Ok(envelope.data)
    }

    /// Create a record.
    pub async fn create_record(&self, input: &CreateRecordInput) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/records", Some(input)).await
    }

    /// Update a record.
    pub async fn update_record(&self, id: &str, input: &UpdateRecordInput) -> Result<(), ClientError> {
        self.send_empty(Method::PUT, &format!("/records/{}", id), Some(input))
            .await
    }

    /// Delete a record.
    pub async fn delete_record(&self, id: &str) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("/records/{}", id), None::<&()>)
            .await
    }

    // ============================================================
    // Company Operations
    // ============================================================

    /// List all companies.
    pub async fn list_companies(&self) -> Result<Vec<Company>, ClientError> {
        let envelope: Envelope<Vec<Company>> =
            self.send(Method::GET, "/companies", None::<&()>).await?;
        Ok(envelope.data)
    }

    /// Get a company by ID.
    pub async fn get_company(&self, id: &str) -> Result<Company, ClientError> {
        let envelope: Envelope<Company> = self
            .send(Method::GET, &format!("/companies/{}", id), None::<&()>)
            .await?;
        Ok(envelope.data)
    }

    /// Create a company.
    pub async fn create_company(&self, input: &CreateCompanyInput) -> Result<(), ClientError> {
        self.send_empty(Method::POST, "/companies", Some(input)).await
    }

    /// Update a company.
    pub async fn update_company(
        &self,
        id: &str,
        input: &UpdateCompanyInput,
    ) -> Result<(), ClientError> {
        self.send_empty(Method::PUT, &format!("/companies/{}", id), Some(input))
            .await
    }

    /// Delete a company.
    pub async fn delete_company(&self, id: &str) -> Result<(), ClientError> {
        self.send_empty(Method::DELETE, &format!("/companies/{}", id), None::<&()>)
            .await
    }
}

/// Convert non-success statuses to ClientError.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::error!("Remote request failed with {}: {}", status, body);
    match status {
        StatusCode::NOT_FOUND => Err(ClientError::NotFound(body)),
        StatusCode::BAD_REQUEST => Err(ClientError::BadRequest(body)),
        StatusCode::UNAUTHORIZED => Err(ClientError::Unauthorized),
        _ => Err(ClientError::Server(format!("{}: {}", status, body))),
    }
}
