//! Authentication-related error types.
//!
//! These are the errors login, signup and protected calls surface to the
//! CLI. Token-level failures inside the session core never reach here;
//! they resolve to an unauthenticated verdict instead.

use std::fmt;

use crate::auth::api::ApiError;
use crate::traits::HttpError;

/// Authentication-specific error variants.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Login was rejected.
    InvalidCredentials { message: String },

    /// Registration was rejected.
    SignupFailed { message: String },

    /// No valid token could be obtained for a protected call.
    SessionExpired,

    /// No session is stored.
    NotAuthenticated,

    /// The backend could not be reached.
    Network(HttpError),

    /// The backend answered with a body we could not use.
    InvalidResponse { message: String },

    /// The backend failed (5xx) while handling an auth request.
    ServerError { status: u16, message: String },
}

impl AuthError {
    /// Classify a failed login. A 4xx uses the backend's `detail`, falling
    /// back to `fallback`.
    pub fn login_rejected(err: ApiError, fallback: &str) -> Self {
        Self::from_api(err, fallback, |message| AuthError::InvalidCredentials { message })
    }

    /// Classify a failed registration.
    pub fn signup_rejected(err: ApiError, fallback: &str) -> Self {
        Self::from_api(err, fallback, |message| AuthError::SignupFailed { message })
    }

    fn from_api(err: ApiError, fallback: &str, rejected: impl FnOnce(String) -> Self) -> Self {
        match err {
            ApiError::Http(e) => AuthError::Network(e),
            ApiError::Decode(message) => AuthError::InvalidResponse { message },
            ApiError::ServerError { status, message } if status >= 500 => {
                AuthError::ServerError { status, message }
            }
            ref rejected_err @ ApiError::ServerError { .. } => {
                rejected(rejected_err.detail().unwrap_or_else(|| fallback.to_string()))
            }
        }
    }

    /// Check if this error might be resolved by re-authenticating.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, AuthError::SessionExpired | AuthError::NotAuthenticated)
    }

    /// Check if retrying the same operation might succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, AuthError::Network(_) | AuthError::ServerError { .. })
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::InvalidCredentials { message } => message.clone(),
            AuthError::SignupFailed { message } => message.clone(),
            AuthError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AuthError::NotAuthenticated => {
                "You are not signed in. Please sign in to continue.".to_string()
            }
            AuthError::Network(HttpError::Timeout(_)) => {
                "The server took too long to respond. Please try again.".to_string()
            }
            AuthError::Network(_) => {
                "Could not reach the AI Meals server. Is the backend running?".to_string()
            }
            AuthError::InvalidResponse { .. } => {
                "The server sent an unexpected response.".to_string()
            }
            AuthError::ServerError { status, .. } => {
                format!("The server failed to handle the request ({}).", status)
            }
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials { .. } => "E_AUTH_INVALID",
            AuthError::SignupFailed { .. } => "E_AUTH_SIGNUP",
            AuthError::SessionExpired => "E_AUTH_SESSION_EXP",
            AuthError::NotAuthenticated => "E_AUTH_NOT_AUTH",
            AuthError::Network(_) => "E_AUTH_NETWORK",
            AuthError::InvalidResponse { .. } => "E_AUTH_RESPONSE",
            AuthError::ServerError { .. } => "E_AUTH_SERVER",
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::InvalidCredentials { message } => {
                write!(f, "Invalid credentials: {}", message)
            }
            AuthError::SignupFailed { message } => write!(f, "Signup failed: {}", message),
            AuthError::SessionExpired => write!(f, "Session expired"),
            AuthError::NotAuthenticated => write!(f, "Not authenticated"),
            AuthError::Network(e) => write!(f, "Network error: {}", e),
            AuthError::InvalidResponse { message } => {
                write!(f, "Invalid response: {}", message)
            }
            AuthError::ServerError { status, message } => {
                write!(f, "Authentication API error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for AuthError {}
