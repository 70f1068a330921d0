//! HTTP API client
//!
//! reqwest-backed `ApiClient`. Every request carries the bearer token when
//! one is configured; non-2xx responses become `ApiError::Status` with the
//! API's `message` field when the body has one.

use super::client::{ApiClient, ApiError};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;
use std::time::Duration;

const USER_AGENT: &str = concat!("orc-console/", env!("CARGO_PKG_VERSION"));

/// Client options
#[derive(Debug, Clone, Default)]
pub struct ApiOptions {
    pub access_token: Option<String>,
    pub timeout: Option<Duration>,
}

/// reqwest-backed API client
pub struct HttpApiClient {
    http_client: reqwest::Client,
    base_url: String,
    timeout: Option<Duration>,
}

impl HttpApiClient {
    pub fn new(base_url: impl Into<String>, options: ApiOptions) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        if let Some(token) = options.access_token.as_deref() {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ApiError::Network(format!("Invalid access token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }

        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers);
        // Unset means no client-side limit
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout: options.timeout,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request timeout, if one was configured
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn read_body(response: reqwest::Response) -> Result<Value, ApiError> {
        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&error_text),
            });
        }

        response
            .json()
            .await
            .map_err(|e| ApiError::Parse(e.to_string()))
    }
}

/// Pull `message` out of a JSON error body, else return the raw text
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str, query: &[(String, String)]) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, params = query.len(), "GET");

        let response = self
            .http_client
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_body(response).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        let url = self.url(path);
        tracing::debug!(url = %url, "POST");

        let response = self
            .http_client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Self::read_body(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = HttpApiClient::new("https://api.example.org/", ApiOptions::default());
        assert!(client.is_ok());
        assert_eq!(client.unwrap().base_url(), "https://api.example.org");
    }

    #[test]
    fn test_timeout_only_when_configured() {
        let client = HttpApiClient::new("https://api.example.org", ApiOptions::default()).unwrap();
        assert_eq!(client.timeout(), None);

        let options = ApiOptions {
            access_token: None,
            timeout: Some(Duration::from_secs(5)),
        };
        let client = HttpApiClient::new("https://api.example.org", options).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_url_joins_path() {
        let client = HttpApiClient::new("https://api.example.org", ApiOptions::default()).unwrap();
        assert_eq!(client.url("/notes"), "https://api.example.org/notes");
        assert_eq!(client.url("groups"), "https://api.example.org/groups");
    }

    #[test]
    fn test_error_message_prefers_json_message() {
        assert_eq!(
            error_message(r#"{"name":"ForbiddenError","message":"Forbidden"}"#),
            "Forbidden"
        );
        assert_eq!(error_message("Bad Gateway"), "Bad Gateway");
    }

    #[test]
    fn test_invalid_token_rejected() {
        let options = ApiOptions {
            access_token: Some("bad\ntoken".to_string()),
            timeout: None,
        };
        assert!(HttpApiClient::new("https://api.example.org", options).is_err());
    }
}
