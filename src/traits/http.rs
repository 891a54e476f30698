//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for HTTP operations, enabling
//! dependency injection and mocking in tests. The session core only ever
//! talks to the backend through [`HttpClient`].

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Insert a header, replacing any existing entry with the same name
/// regardless of case.
pub fn set_header(headers: &mut Headers, name: &str, value: impl Into<String>) {
    headers.retain(|key, _| !key.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.into());
}

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Method {
    /// Upper-case method name as sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        }
    }

    /// Parse a method name, case-insensitively.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "GET" => Some(Method::Get),
            "POST" => Some(Method::Post),
            "PUT" => Some(Method::Put),
            "PATCH" => Some(Method::Patch),
            "DELETE" => Some(Method::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outbound HTTP request.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    /// Upper bound on the whole exchange. `None` uses the client default.
    pub timeout: Option<Duration>,
}

impl Request {
    /// Create a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Headers::new(),
            body: None,
            timeout: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::Post, url)
    }

    /// Set a header, replacing any existing one with the same name.
    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// Set a bearer `Authorization` header.
    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {}", token))
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serialize `value` as the JSON body and set the content type.
    pub fn json<T: Serialize + ?Sized>(self, value: &T) -> Result<Self, HttpError> {
        let body = serde_json::to_string(value).map_err(|e| HttpError::Other(e.to_string()))?;
        Ok(self.header("Content-Type", "application/json").body(body))
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Create a response whose body is the serialized `value`.
    pub fn json_body(status: u16, value: &serde_json::Value) -> Self {
        let mut headers = Headers::new();
        headers.insert("content-type".to_string(), "application/json".to_string());
        Self::with_headers(status, headers, Bytes::from(value.to_string()))
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the server rejected the credentials (401).
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP client errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Server returned an error status
    ServerError { status: u16, message: String },
    /// IO error
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for HTTP client operations.
///
/// Implementations include the production reqwest-based client and the
/// scripted mock used in tests.
///
/// # Example
///
/// ```ignore
/// use aimeals::traits::{HttpClient, Request};
///
/// async fn is_healthy<C: HttpClient>(client: &C) -> bool {
///     client
///         .send(Request::get("http://localhost:8000/health"))
///         .await
///         .map(|r| r.is_success())
///         .unwrap_or(false)
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send a request and buffer the whole response.
    ///
    /// Non-2xx statuses are returned as `Ok(Response)`; only transport
    /// failures (connect, timeout, IO) are errors.
    async fn send(&self, request: Request) -> Result<Response, HttpError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_is_success() {
        assert!(Response::new(200, Bytes::new()).is_success());
        assert!(Response::new(204, Bytes::new()).is_success());
        assert!(!Response::new(301, Bytes::new()).is_success());
        assert!(!Response::new(401, Bytes::new()).is_success());
        assert!(Response::new(401, Bytes::new()).is_unauthorized());
        assert!(!Response::new(403, Bytes::new()).is_unauthorized());
    }

    #[test]
    fn test_response_json() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        struct Profile {
            email: String,
        }

        let response = Response::json_body(200, &serde_json::json!({ "email": "a@b.c" }));
        let profile: Profile = response.json().unwrap();
        assert_eq!(profile.email, "a@b.c");
        assert_eq!(
            response.headers.get("content-type"),
            Some(&"application/json".to_string())
        );
    }

    #[test]
    fn test_set_header_replaces_case_insensitively() {
        let mut headers = Headers::new();
        headers.insert("authorization".to_string(), "Bearer stale".to_string());
        set_header(&mut headers, "Authorization", "Bearer fresh");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Authorization"), Some(&"Bearer fresh".to_string()));
    }

    #[test]
    fn test_request_builder() {
        let request = Request::post("http://localhost/api")
            .json(&serde_json::json!({ "refresh_token": "r" }))
            .unwrap()
            .bearer("abc")
            .timeout(Duration::from_secs(5));

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.body.as_deref(), Some(r#"{"refresh_token":"r"}"#));
        assert_eq!(
            request.headers.get("Content-Type"),
            Some(&"application/json".to_string())
        );
        assert_eq!(request.headers.get("Authorization"), Some(&"Bearer abc".to_string()));
        assert_eq!(request.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_method_parse() {
        assert_eq!(Method::parse("get"), Some(Method::Get));
        assert_eq!(Method::parse("Delete"), Some(Method::Delete));
        assert_eq!(Method::parse("TRACE"), None);
        assert_eq!(Method::Patch.to_string(), "PATCH");
    }

    #[test]
    fn test_http_error_display() {
        assert_eq!(
            HttpError::Timeout("15s".to_string()).to_string(),
            "Request timeout: 15s"
        );
        assert_eq!(
            HttpError::ServerError {
                status: 500,
                message: "Internal Error".to_string()
            }
            .to_string(),
            "Server error (500): Internal Error"
        );
    }
}
