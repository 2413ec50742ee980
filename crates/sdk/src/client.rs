//! Main client for the Bexio SDK.

use crate::config::{ClientConfig, RetryConfig, DEFAULT_BASE_URL};
use crate::error::{SdkError, SdkResult};
use crate::transport::HttpTransport;
use async_trait::async_trait;
use bexio_core::{
    Action, BexioApi, Endpoint, FileDownload, FileUpload, PageRequest, RemoteError,
    SearchCriterion,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Client for the Bexio REST API.
#[derive(Debug, Clone)]
pub struct BexioClient {
    config: Arc<ClientConfig>,
    pub(crate) http: HttpTransport,
}

impl BexioClient {
    /// Create a new client builder.
    pub fn builder() -> BexioClientBuilder {
        BexioClientBuilder::new()
    }

    fn from_config(config: ClientConfig) -> SdkResult<Self> {
        let config = Arc::new(config);
        let http = HttpTransport::new(config.clone())?;

        Ok(Self { config, http })
    }

    pub fn base_url(&self) -> &Url {
        &self.config.base_url
    }
}

/// Builder for creating a BexioClient.
pub struct BexioClientBuilder {
    base_url: String,
    api_token: Option<String>,
    timeout: Duration,
    retry_config: RetryConfig,
}

impl BexioClientBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: None,
            timeout: Duration::from_secs(30),
            retry_config: RetryConfig::default(),
        }
    }

    /// Set the API root. Defaults to the public Bexio API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the personal access token.
    pub fn api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry configuration.
    pub fn retry_config(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }

    /// Build the client.
    pub fn build(self) -> SdkResult<BexioClient> {
        let api_token = self
            .api_token
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SdkError::Config("api_token is required".to_string()))?;

        // Relative joins drop the last path segment unless it ends in a slash.
        let mut base_url = self.base_url;
        if !base_url.ends_with('/') {
            base_url.push('/');
        }
        let base_url = Url::parse(&base_url)?;

        let config = ClientConfig {
            base_url,
            api_token,
            timeout: self.timeout,
            retry_config: self.retry_config,
        };

        BexioClient::from_config(config)
    }
}

impl Default for BexioClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Bexio list endpoints answer with a bare array; some newer ones wrap it in
/// `{"data": [...]}`.
fn into_items(body: Value) -> Result<Vec<Value>, RemoteError> {
    match body {
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("data") {
            Some(Value::Array(items)) => Ok(items),
            _ => Err(RemoteError::transport("Expected a list response")),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(RemoteError::transport("Expected a list response")),
    }
}

fn record_path(endpoint: &Endpoint, id: u64) -> String {
    format!("{}/{}", endpoint.path(), id)
}

#[async_trait]
impl BexioApi for BexioClient {
    async fn list(&self, endpoint: &Endpoint, page: PageRequest) -> Result<Vec<Value>, RemoteError> {
        let mut query = vec![
            ("limit".to_string(), page.limit.to_string()),
            ("offset".to_string(), page.offset.to_string()),
        ];
        query.extend(endpoint.filters.iter().cloned());

        let body = self.http.get(&endpoint.path(), &query).await?;
        into_items(body)
    }

    async fn get(&self, endpoint: &Endpoint, id: u64) -> Result<Option<Value>, RemoteError> {
        Ok(self.http.get_optional(&record_path(endpoint, id)).await?)
    }

    async fn create(&self, endpoint: &Endpoint, body: Value) -> Result<Value, RemoteError> {
        let no_query: &[(&str, &str)] = &[];
        Ok(self.http.post(&endpoint.path(), &body, no_query).await?)
    }

    async fn update(&self, endpoint: &Endpoint, id: u64, body: Value) -> Result<Value, RemoteError> {
        let path = record_path(endpoint, id);
        // The 2.0 API edits with POST on the record; later versions use PUT.
        if path.starts_with("2.0/") {
            let no_query: &[(&str, &str)] = &[];
            Ok(self.http.post(&path, &body, no_query).await?)
        } else {
            Ok(self.http.put(&path, &body).await?)
        }
    }

    async fn delete(&self, endpoint: &Endpoint, id: u64) -> Result<Value, RemoteError> {
        let body = self.http.delete(&record_path(endpoint, id)).await?;
        Ok(match body {
            Value::Null => json!({ "success": true }),
            other => other,
        })
    }

    async fn search(
        &self,
        endpoint: &Endpoint,
        criteria: &[SearchCriterion],
        limit: Option<u64>,
        offset: Option<u64>,
    ) -> Result<Vec<Value>, RemoteError> {
        let mut query = Vec::new();
        if let Some(limit) = limit {
            query.push(("limit", limit.to_string()));
        }
        if let Some(offset) = offset {
            query.push(("offset", offset.to_string()));
        }

        let path = format!("{}/search", endpoint.path());
        let body = self.http.post(&path, criteria, &query).await?;
        into_items(body)
    }

    async fn act(&self, endpoint: &Endpoint, id: u64, action: Action) -> Result<Value, RemoteError> {
        let path = format!("{}/{}", record_path(endpoint, id), action.path_segment());
        let no_query: &[(&str, &str)] = &[];
        let body = self.http.post(&path, &json!({}), no_query).await?;
        Ok(match body {
            Value::Null => json!({ "success": true }),
            other => other,
        })
    }

    async fn current_user(&self) -> Result<Value, RemoteError> {
        let no_query: &[(&str, &str)] = &[];
        Ok(self.http.get("3.0/users/me", no_query).await?)
    }

    async fn upload_file(&self, upload: FileUpload) -> Result<Value, RemoteError> {
        Ok(self
            .http
            .post_multipart("3.0/files", &upload.name, &upload.content_type, upload.content)
            .await?)
    }

    async fn download_file(&self, id: u64) -> Result<Option<FileDownload>, RemoteError> {
        let download = self.http.get_bytes(&format!("3.0/files/{}/download", id)).await?;
        Ok(download.map(|d| FileDownload {
            content_type: d.content_type,
            content: d.content.to_vec(),
        }))
    }
}
