//! OOTD HTTP Client
//!
//! A small, type-safe HTTP client for the OOTD backend's style-analysis API.
//!
//! Both the poller and the CLI go through this client, so request building,
//! authentication and error mapping live in one place.
//!
//! # Example
//!
//! ```no_run
//! use ootd_client::BackendClient;
//! use ootd_core::dto::analysis::StyleAnalysisRequest;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let client = BackendClient::new("http://localhost:8000");
//!
//!     let task = client
//!         .submit_style_analysis(&StyleAnalysisRequest {
//!             text_requirements: Some("smart casual for a first date".to_string()),
//!             ..Default::default()
//!         })
//!         .await?;
//!
//!     println!("Submitted task: {}", task.task_id);
//!     Ok(())
//! }
//! ```

pub mod error;
mod tasks;

pub use error::{ClientError, Result};

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// HTTP client for the OOTD backend
///
/// Endpoints are grouped by concern:
/// - Task submission and status (primary analysis and avatar sub-task)
/// - Task administration (list, delete, clear)
/// - Health
#[derive(Debug, Clone)]
pub struct BackendClient {
    /// Base URL of the backend (e.g., "http://localhost:8000")
    base_url: String,
    /// Bearer token attached to every request when set
    auth_token: Option<String>,
    /// HTTP client instance
    client: Client,
}

impl BackendClient {
    /// Create a new backend client
    ///
    /// # Arguments
    /// * `base_url` - The base URL of the backend (e.g., "http://localhost:8000")
    ///
    /// # Example
    /// ```
    /// use ootd_client::BackendClient;
    ///
    /// let client = BackendClient::new("http://localhost:8000");
    /// ```
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    /// Create a new backend client with a custom HTTP client
    ///
    /// This allows you to configure timeouts, proxies, TLS settings, etc.
    ///
    /// # Example
    /// ```
    /// use ootd_client::BackendClient;
    /// use reqwest::Client;
    /// use std::time::Duration;
    ///
    /// let http_client = Client::builder()
    ///     .timeout(Duration::from_secs(10))
    ///     .build()
    ///     .unwrap();
    ///
    /// let client = BackendClient::with_client("http://localhost:8000", http_client);
    /// ```
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
            client,
        }
    }

    /// Create a client whose every request is bounded by `timeout`
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::InternalError(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(base_url, client))
    }

    /// Attach a bearer token to all subsequent requests
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Get the base URL of the backend
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn has_token(&self) -> bool {
        self.auth_token.is_some()
    }

    /// Build a request for a path under the base URL
    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let builder = self.client.request(method, url);

        match &self.auth_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }
}

/// Handle an API response and deserialize JSON
///
/// Non-2xx status codes become [`ClientError::ApiError`] carrying the body
/// text; successful bodies are decoded into `T`.
pub(crate) async fn handle_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = BackendClient::new("http://localhost:8000");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(!client.has_token());
    }

    #[test]
    fn test_client_trims_trailing_slash() {
        let client = BackendClient::new("http://localhost:8000/");
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[test]
    fn test_client_with_timeout_and_token() {
        let client = BackendClient::with_timeout("http://localhost:8000", Duration::from_secs(10))
            .unwrap()
            .with_token("secret");
        assert_eq!(client.base_url(), "http://localhost:8000");
        assert!(client.has_token());
    }

    #[test]
    fn test_request_url() {
        let client = BackendClient::new("http://localhost:8000/");
        let request = client
            .request(Method::GET, "/api/style/health")
            .build()
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8000/api/style/health");
        assert!(request.headers().get("authorization").is_none());
    }

    #[test]
    fn test_request_carries_bearer_token() {
        let client = BackendClient::new("http://localhost:8000").with_token("abc");
        let request = client.request(Method::GET, "/api/style/tasks").build().unwrap();
        assert_eq!(
            request.headers().get("authorization").unwrap(),
            "Bearer abc"
        );
    }
}
