//! Authenticated request wrapper.
//!
//! [`SessionContext::request`] sends a call to a protected resource with the
//! current bearer token, refreshing first when the token is known to be
//! expired and once more when the server answers 401.

use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use super::session::SessionContext;
use super::token;
use crate::traits::{set_header, Headers, HttpError, Method, Request, Response};

/// Errors from [`SessionContext::request`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RequestError {
    /// No valid access token could be obtained. Callers should send the
    /// user to the login view.
    #[error("Session expired. Please log in again.")]
    SessionExpired,

    #[error(transparent)]
    Transport(#[from] HttpError),
}

/// Method, headers, body and timeout of a protected call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: Headers,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn header(mut self, name: &str, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name, value);
        self
    }

    /// JSON body; also sets the content type.
    pub fn json_body(self, body: impl Into<String>) -> Self {
        let mut options = self.header("Content-Type", "application/json");
        options.body = Some(body.into());
        options
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Build the outbound request. Caller headers are kept; `Authorization`
    /// is replaced when a token is given.
    pub fn to_request(&self, url: &str, access_token: Option<&str>) -> Request {
        let mut request = Request::new(self.method.unwrap_or(Method::Get), url);
        request.headers = self.headers.clone();
        request.body = self.body.clone();
        request.timeout = self.timeout;
        match access_token {
            Some(token) => request.bearer(token),
            None => request,
        }
    }
}

impl SessionContext {
    /// Send an authenticated request to `url`.
    ///
    /// The protected resource is called at most twice: once, and once more
    /// after a successful refresh if the first answer was 401. The second
    /// answer is returned as-is.
    pub async fn request(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> Result<Response, RequestError> {
        let mut access_token = self.store().access_token().await;

        if access_token.is_some() && token::is_expired(access_token.as_deref()) {
            debug!(url, "Access token expired before request, refreshing");
            if !self.refresh().await {
                return Err(RequestError::SessionExpired);
            }
            access_token = self.store().access_token().await;
        }

        let response = self
            .api()
            .http()
            .send(options.to_request(url, access_token.as_deref()))
            .await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        warn!(url, "Request rejected with 401, refreshing once");
        if !self.refresh().await {
            return Err(RequestError::SessionExpired);
        }
        let access_token = self.store().access_token().await;
        let retried = self
            .api()
            .http()
            .send(options.to_request(url, access_token.as_deref()))
            .await?;
        Ok(retried)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_request_replaces_caller_authorization() {
        let options = RequestOptions::new()
            .method(Method::Post)
            .header("authorization", "Bearer caller")
            .header("X-Trace", "1")
            .json_body(r#"{"days":7}"#);

        let request = options.to_request("http://api.test/plans", Some("session"));

        assert_eq!(request.method, Method::Post);
        assert_eq!(request.headers.len(), 3);
        assert_eq!(
            request.headers.get("Authorization"),
            Some(&"Bearer session".to_string())
        );
        assert_eq!(request.headers.get("X-Trace"), Some(&"1".to_string()));
        assert_eq!(request.body.as_deref(), Some(r#"{"days":7}"#));
    }

    #[test]
    fn test_to_request_without_token_sends_no_authorization() {
        let request = RequestOptions::new().to_request("http://api.test/recipes", None);
        assert_eq!(request.method, Method::Get);
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_request_error_display() {
        assert_eq!(
            RequestError::SessionExpired.to_string(),
            "Session expired. Please log in again."
        );
        let transport: RequestError = HttpError::Timeout("15s".to_string()).into();
        assert_eq!(transport.to_string(), "Request timeout: 15s");
    }
}
