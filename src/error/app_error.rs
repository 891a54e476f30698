//! Unified error type for the AI Meals client.
//!
//! `AppError` collects the domain errors the CLI can run into so command
//! handlers can return one type and report it consistently.

use std::fmt;

use super::auth::AuthError;
use super::category::ErrorCategory;
use crate::auth::request::RequestError;
use crate::startup::config::ConfigError;
use crate::traits::{HttpError, StorageError};

/// Unified error type.
#[derive(Debug)]
pub enum AppError {
    /// Login, signup and session errors.
    Auth(AuthError),

    /// Transport errors outside the auth flows.
    Http(HttpError),

    /// Persisted storage errors.
    Storage(StorageError),

    /// Invalid configuration.
    Config(ConfigError),

    /// Terminal IO, e.g. reading a password.
    Io(std::io::Error),
}

impl AppError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AppError::Auth(err) => match err {
                AuthError::Network(_) => ErrorCategory::Network,
                AuthError::ServerError { .. } | AuthError::InvalidResponse { .. } => {
                    ErrorCategory::Server
                }
                _ if err.requires_reauth() => ErrorCategory::Auth,
                _ => ErrorCategory::User,
            },
            AppError::Http(HttpError::ServerError { status, .. }) if *status >= 500 => {
                ErrorCategory::Server
            }
            AppError::Http(HttpError::InvalidUrl(_)) => ErrorCategory::Configuration,
            AppError::Http(_) => ErrorCategory::Network,
            AppError::Storage(_) => ErrorCategory::System,
            AppError::Config(_) => ErrorCategory::Configuration,
            AppError::Io(_) => ErrorCategory::System,
        }
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Auth(err) => err.user_message(),
            AppError::Http(HttpError::Timeout(_)) => {
                "The server took too long to respond.".to_string()
            }
            AppError::Http(err) => format!("Request failed: {}", err),
            AppError::Storage(err) => format!("Could not access local session data: {}", err),
            AppError::Config(err) => format!("Invalid configuration: {}", err),
            AppError::Io(err) => format!("Terminal error: {}", err),
        }
    }

    /// Whether the user should sign in again.
    pub fn requires_reauth(&self) -> bool {
        matches!(self, AppError::Auth(err) if err.requires_reauth())
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Auth(err) => write!(f, "{}", err),
            AppError::Http(err) => write!(f, "{}", err),
            AppError::Storage(err) => write!(f, "{}", err),
            AppError::Config(err) => write!(f, "{}", err),
            AppError::Io(err) => write!(f, "IO error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Auth(err) => Some(err),
            AppError::Http(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Config(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Auth(err)
    }
}

impl From<HttpError> for AppError {
    fn from(err: HttpError) -> Self {
        AppError::Http(err)
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        AppError::Storage(err)
    }
}

impl From<ConfigError> for AppError {
    fn from(err: ConfigError) -> Self {
        AppError::Config(err)
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Io(err)
    }
}

impl From<RequestError> for AppError {
    fn from(err: RequestError) -> Self {
        match err {
            RequestError::SessionExpired => AppError::Auth(AuthError::SessionExpired),
            RequestError::Transport(e) => AppError::Http(e),
        }
    }
}
