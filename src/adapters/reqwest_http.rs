//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production HTTP client implementation using
//! reqwest, implementing the [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Method, Request, Response};

/// Default upper bound on a single request when the caller sets none.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(15_000);

/// HTTP client implementation using reqwest.
///
/// Every request is bounded by a timeout: the request's own, or the
/// client default. A stalled backend surfaces as [`HttpError::Timeout`].
///
/// # Example
///
/// ```ignore
/// use aimeals::adapters::ReqwestHttpClient;
/// use aimeals::traits::{HttpClient, Request};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.send(Request::get("http://localhost:8000/health")).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    default_timeout: Duration,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client,
            default_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Override the timeout used when a request does not carry its own.
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    fn convert_method(method: Method) -> reqwest::Method {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn send(&self, request: Request) -> Result<Response, HttpError> {
        let timeout = request.timeout.unwrap_or(self.default_timeout);
        let builder = self
            .client
            .request(Self::convert_method(request.method), &request.url)
            .timeout(timeout);
        let mut builder = Self::apply_headers(builder, &request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reqwest_http_client_default_timeout() {
        let client = ReqwestHttpClient::default();
        assert_eq!(client.default_timeout(), DEFAULT_REQUEST_TIMEOUT);

        let client = client.with_default_timeout(Duration::from_secs(2));
        assert_eq!(client.default_timeout(), Duration::from_secs(2));
    }

    #[test]
    fn test_convert_headers() {
        let mut header_map = reqwest::header::HeaderMap::new();
        header_map.insert(
            reqwest::header::CONTENT_TYPE,
            "application/json".parse().unwrap(),
        );

        let headers = ReqwestHttpClient::convert_headers(&header_map);
        assert_eq!(
            headers.get("content-type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_convert_method() {
        assert_eq!(
            ReqwestHttpClient::convert_method(Method::Patch),
            reqwest::Method::PATCH
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(Method::Get),
            reqwest::Method::GET
        );
    }

    #[tokio::test]
    async fn test_send_invalid_url() {
        let client = ReqwestHttpClient::new();
        let result = client.send(Request::get("not-a-valid-url")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_send_connection_refused() {
        let client = ReqwestHttpClient::new();
        let result = client
            .send(Request::post("http://127.0.0.1:59999/auth/refresh").body("{}"))
            .await;
        assert!(matches!(
            result,
            Err(HttpError::ConnectionFailed(_)) | Err(HttpError::Other(_))
        ));
    }
}
