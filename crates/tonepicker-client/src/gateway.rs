//! HTTP client for the tonepicker API.
//!
//! Every failure is turned into a message fit to show a user: the server's
//! own `error` field when it sent one, otherwise a canned message for the
//! status, the transport, or the local fault.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{error, info};

use tonepicker_core::{AdjustToneBody, AdjustmentResult, ErrorBody, HealthStatus};

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiFailure {
    /// The server answered with a non-success status.
    #[error("{message}")]
    Status { status: u16, message: String },
    /// No response was received (connect failure, timeout, reset).
    #[error("Network error. Please check your internet connection.")]
    Network,
    /// Something went wrong locally, before or after the exchange.
    #[error("{0}")]
    Unexpected(String),
}

impl ApiFailure {
    fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let server_message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .map(|b| b.error)
            .filter(|m| !m.is_empty());
        let message = server_message.unwrap_or_else(|| match status.as_u16() {
            400 => "Invalid request. Please check your input.".to_string(),
            401 => "Authentication failed. Please check your API key.".to_string(),
            429 => "Rate limit exceeded. Please try again later.".to_string(),
            500 => "Server error. Please try again later.".to_string(),
            other => format!("Request failed with status {other}"),
        });
        Self::Status {
            status: status.as_u16(),
            message,
        }
    }

    fn from_transport(err: &reqwest::Error) -> Self {
        if err.is_builder() {
            Self::unexpected(err.to_string())
        } else if err.is_connect() || err.is_timeout() || err.is_request() {
            Self::Network
        } else {
            Self::unexpected(err.to_string())
        }
    }

    fn unexpected(message: String) -> Self {
        if message.trim().is_empty() {
            Self::Unexpected("An unexpected error occurred.".to_string())
        } else {
            Self::Unexpected(message)
        }
    }
}

/// An [`ApiFailure`] with the name of the operation that hit it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{context}: {failure}")]
pub struct GatewayError {
    pub context: &'static str,
    #[source]
    pub failure: ApiFailure,
}

impl GatewayError {
    fn new(context: &'static str, failure: ApiFailure) -> Self {
        Self { context, failure }
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, GatewayError> {
        Self::with_timeout(base_url, REQUEST_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GatewayError::new("Failed to create API client", ApiFailure::unexpected(e.to_string())))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Base URL from `TONEPICKER_API_URL`, falling back to the local dev server.
    pub fn from_env() -> Result<Self, GatewayError> {
        let base_url = std::env::var("TONEPICKER_API_URL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        Self::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ask the server to rewrite `text` at grid point (x, y).
    pub async fn adjust_tone(&self, text: &str, x: i64, y: i64) -> Result<AdjustmentResult, GatewayError> {
        let body = AdjustToneBody {
            text: text.trim().to_string(),
            x,
            y,
        };
        self.call(Method::POST, "/adjust-tone", Some(&body))
            .await
            .map_err(|f| GatewayError::new("Failed to adjust tone", f))
    }

    pub async fn check_health(&self) -> Result<HealthStatus, GatewayError> {
        self.call(Method::GET, "/health", None)
            .await
            .map_err(|f| GatewayError::new("Health check failed", f))
    }

    pub async fn test_connection(&self) -> bool {
        match self.check_health().await {
            Ok(_) => true,
            Err(err) => {
                error!(error = %err, "API connection test failed");
                false
            }
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&AdjustToneBody>,
    ) -> Result<T, ApiFailure> {
        let url = format!("{}{}", self.base_url, path);
        info!("API Request: {} {}", method, url);

        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|err| {
            error!(error = %err, "API Request Error");
            ApiFailure::from_transport(&err)
        })?;

        let status = response.status();
        info!("API Response: {} {}", status.as_u16(), url);

        let bytes = response
            .bytes()
            .await
            .map_err(|err| ApiFailure::from_transport(&err))?;

        if !status.is_success() {
            let failure = ApiFailure::from_status(status, &bytes);
            error!(status = status.as_u16(), error = %failure, "API Response Error");
            return Err(failure);
        }

        serde_json::from_slice(&bytes).map_err(|err| ApiFailure::unexpected(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_wins_over_defaults() {
        let failure = ApiFailure::from_status(StatusCode::BAD_REQUEST, br#"{"error":"Text is required"}"#);
        assert_eq!(
            failure,
            ApiFailure::Status {
                status: 400,
                message: "Text is required".to_string()
            }
        );
    }

    #[test]
    fn defaults_by_status() {
        let cases = [
            (StatusCode::BAD_REQUEST, "Invalid request. Please check your input."),
            (StatusCode::UNAUTHORIZED, "Authentication failed. Please check your API key."),
            (StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded. Please try again later."),
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error. Please try again later."),
            (StatusCode::SERVICE_UNAVAILABLE, "Request failed with status 503"),
        ];
        for (status, expected) in cases {
            assert_eq!(ApiFailure::from_status(status, b"").to_string(), expected);
        }
    }

    #[test]
    fn empty_server_message_falls_back() {
        let failure = ApiFailure::from_status(StatusCode::TOO_MANY_REQUESTS, br#"{"error":""}"#);
        assert_eq!(failure.to_string(), "Rate limit exceeded. Please try again later.");
    }

    #[test]
    fn gateway_error_prefixes_context() {
        let err = GatewayError::new("Failed to adjust tone", ApiFailure::Network);
        assert_eq!(
            err.to_string(),
            "Failed to adjust tone: Network error. Please check your internet connection."
        );
        assert_eq!(
            ApiFailure::unexpected("  ".to_string()).to_string(),
            "An unexpected error occurred."
        );
    }
}
