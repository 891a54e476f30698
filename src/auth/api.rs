//! Typed client for the AI Meals authentication endpoints.
//!
//! All auth routes live under `{base}/api/v1`; the health check is served
//! from the bare base URL. Every call carries a timeout.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::adapters::reqwest_http::DEFAULT_REQUEST_TIMEOUT;
use crate::auth::credentials::{TokenPair, User};
use crate::traits::{HttpClient, HttpError, Request, Response};

/// Path prefix of the versioned API.
pub const API_PREFIX: &str = "/api/v1";

/// Registration is expected to answer quickly; a slow backend fails fast.
pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(5);

/// Timeout of the health check.
pub const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);

/// Errors from the auth API.
#[derive(Debug, Error, Clone)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Invalid response body: {0}")]
    Decode(String),

    #[error("Server error ({status}): {message}")]
    ServerError { status: u16, message: String },
}

impl ApiError {
    /// The backend's `detail` message for a rejected request, if any.
    pub fn detail(&self) -> Option<String> {
        match self {
            ApiError::ServerError { message, .. } => {
                let value: serde_json::Value = serde_json::from_str(message).ok()?;
                value.get("detail")?.as_str().map(str::to_string)
            }
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

/// Response of `POST /auth/login`.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_id")]
    pub user_id: Option<String>,
}

impl LoginResponse {
    pub fn tokens(&self) -> TokenPair {
        TokenPair::new(&self.access_token, &self.refresh_token)
    }
}

/// Response of `GET /auth/me`.
#[derive(Debug, Clone, Deserialize)]
pub struct MeResponse {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

impl From<MeResponse> for User {
    fn from(me: MeResponse) -> Self {
        User {
            id: me.id,
            email: me.email,
            first_name: me.first_name.unwrap_or_default(),
            last_name: me.last_name.unwrap_or_default(),
        }
    }
}

/// Body of `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct NewAccount {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
}

impl std::fmt::Debug for NewAccount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewAccount")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .finish()
    }
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Backend ids are integers; older deployments send strings.
fn id_from_value(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::String(s) => Some(s),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    id_from_value(value).ok_or_else(|| serde::de::Error::custom("id must be a number or string"))
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: serde_json::Value = Deserialize::deserialize(deserializer)?;
    Ok(id_from_value(value))
}

/// Client for the auth endpoints.
#[derive(Clone)]
pub struct AuthApi {
    base_url: String,
    http: Arc<dyn HttpClient>,
    timeout: Duration,
}

impl std::fmt::Debug for AuthApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthApi")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AuthApi {
    /// Create a client for the backend at `base_url` (without `/api/v1`).
    pub fn new(base_url: impl Into<String>, http: Arc<dyn HttpClient>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            http,
            timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Set the timeout used by calls without a dedicated one.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Absolute URL of a versioned API path such as `/auth/me`.
    pub fn api_url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}{}", self.base_url, API_PREFIX, path)
        } else {
            format!("{}{}/{}", self.base_url, API_PREFIX, path)
        }
    }

    /// The underlying HTTP client.
    pub fn http(&self) -> &Arc<dyn HttpClient> {
        &self.http
    }

    /// Turn a non-success status into [`ApiError::ServerError`].
    fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.is_success() {
            return Ok(response);
        }
        let message = response
            .text()
            .unwrap_or_else(|_| "Unknown error".to_string());
        Err(ApiError::ServerError {
            status: response.status,
            message,
        })
    }

    /// POST /auth/login
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request = Request::post(self.api_url("/auth/login"))
            .json(&LoginRequest { email, password })?
            .timeout(self.timeout);
        let response = Self::check_response(self.http.send(request).await?)?;
        Ok(response.json()?)
    }

    /// POST /auth/register
    ///
    /// Returns the raw response; the body is not used by the signup flow.
    pub async fn register(&self, account: &NewAccount) -> Result<Response, ApiError> {
        let request = Request::post(self.api_url("/auth/register"))
            .json(account)?
            .timeout(REGISTER_TIMEOUT);
        Self::check_response(self.http.send(request).await?)
    }

    /// GET /auth/me
    pub async fn me(&self, access_token: &str) -> Result<User, ApiError> {
        let request = Request::get(self.api_url("/auth/me"))
            .bearer(access_token)
            .timeout(self.timeout);
        let response = Self::check_response(self.http.send(request).await?)?;
        let me: MeResponse = response.json()?;
        Ok(me.into())
    }

    /// POST /auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        let request = Request::post(self.api_url("/auth/refresh"))
            .json(&RefreshRequest { refresh_token })?
            .timeout(self.timeout);
        let response = Self::check_response(self.http.send(request).await?)?;
        Ok(response.json()?)
    }

    /// GET /health, returning the status code of any answer.
    pub async fn health(&self) -> Result<u16, HttpError> {
        let request = Request::get(format!("{}/health", self.base_url)).timeout(HEALTH_TIMEOUT);
        let response = self.http.send(request).await?;
        Ok(response.status)
    }
}
