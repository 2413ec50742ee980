//! HTTP transport layer for the Bexio SDK.

use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use bytes::Bytes;
use reqwest::{header, multipart, Client, RequestBuilder, Response};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Raw file content returned by a download.
#[derive(Debug, Clone)]
pub struct Download {
    pub content_type: String,
    pub content: Bytes,
}

/// HTTP transport for making API requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    config: Arc<ClientConfig>,
}

impl HttpTransport {
    /// Create a new HTTP transport with the given configuration.
    pub fn new(config: Arc<ClientConfig>) -> SdkResult<Self> {
        let mut headers = header::HeaderMap::new();

        let mut auth = header::HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| SdkError::Config("Invalid API token format".to_string()))?;
        auth.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self { client, config })
    }

    /// Build a URL for the given path.
    fn build_url(&self, path: &str) -> SdkResult<url::Url> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Execute a request with retries.
    async fn execute_with_retry(
        &self,
        request_builder: RequestBuilder,
        idempotent: bool,
    ) -> SdkResult<Response> {
        let retry_config = &self.config.retry_config;
        let mut attempts = 0;

        loop {
            let request = request_builder
                .try_clone()
                .ok_or_else(|| SdkError::Config("Request cannot be cloned".to_string()))?;

            match request.send().await {
                Ok(response) => {
                    let status = response.status().as_u16();

                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if attempts < retry_config.max_retries
                        && retry_config.should_retry_status(status, idempotent)
                    {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            status = status,
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            "Request failed, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }

                    return Err(error_from(response).await);
                }
                Err(e) => {
                    let retryable = e.is_connect() || (idempotent && e.is_timeout());
                    if attempts < retry_config.max_retries && retryable {
                        let backoff = retry_config.backoff_for_attempt(attempts);
                        warn!(
                            attempt = attempts + 1,
                            backoff_ms = backoff.as_millis(),
                            error = %e,
                            "Request did not complete, retrying"
                        );
                        tokio::time::sleep(backoff).await;
                        attempts += 1;
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Execute a GET request with query parameters.
    pub async fn get<Q: Serialize + ?Sized>(&self, path: &str, query: &Q) -> SdkResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        let response = self
            .execute_with_retry(self.client.get(url).query(query), true)
            .await?;
        read_json(response).await
    }

    /// Execute a GET request, mapping 404 to `None`.
    pub async fn get_optional(&self, path: &str) -> SdkResult<Option<Value>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request");

        match self.execute_with_retry(self.client.get(url), true).await {
            Ok(response) => read_json(response).await.map(Some),
            Err(SdkError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Execute a POST request.
    pub async fn post<B: Serialize + ?Sized, Q: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        query: &Q,
    ) -> SdkResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, "POST request");

        let response = self
            .execute_with_retry(self.client.post(url).query(query).json(body), false)
            .await?;
        read_json(response).await
    }

    /// Execute a PUT request.
    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> SdkResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, "PUT request");

        let response = self
            .execute_with_retry(self.client.put(url).json(body), true)
            .await?;
        read_json(response).await
    }

    /// Execute a DELETE request.
    pub async fn delete(&self, path: &str) -> SdkResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, "DELETE request");

        let response = self.execute_with_retry(self.client.delete(url), true).await?;
        read_json(response).await
    }

    /// Upload one file as `multipart/form-data`. Multipart bodies are streamed
    /// and cannot be replayed, so this is a single attempt.
    pub async fn post_multipart(
        &self,
        path: &str,
        file_name: &str,
        content_type: &str,
        content: Vec<u8>,
    ) -> SdkResult<Value> {
        let url = self.build_url(path)?;
        debug!(url = %url, file_name, bytes = content.len(), "Multipart POST request");

        let part = multipart::Part::bytes(content)
            .file_name(file_name.to_string())
            .mime_str(content_type)?;
        let form = multipart::Form::new().part("file", part);

        let response = self.client.post(url).multipart(form).send().await?;
        if !response.status().is_success() {
            return Err(error_from(response).await);
        }
        read_json(response).await
    }

    /// Download raw bytes, mapping 404 to `None`.
    pub async fn get_bytes(&self, path: &str) -> SdkResult<Option<Download>> {
        let url = self.build_url(path)?;
        debug!(url = %url, "GET request (binary)");

        let response = match self
            .execute_with_retry(
                self.client.get(url).header(header::ACCEPT, "*/*"),
                true,
            )
            .await
        {
            Ok(response) => response,
            Err(SdkError::Api { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("application/octet-stream")
            .to_string();
        let content = response.bytes().await?;
        Ok(Some(Download {
            content_type,
            content,
        }))
    }
}

async fn error_from(response: Response) -> SdkError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    SdkError::from_response(status, &body)
}

/// Parse a JSON body; an empty body (e.g. 204) reads as `null`.
async fn read_json(response: Response) -> SdkResult<Value> {
    let body = response.bytes().await?;
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_slice(&body)?)
}
