//! Error category classification.
//!
//! Categories drive what the CLI tells the user and whether an operation is
//! worth retrying.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures and timeouts. Transient.
    Network,

    /// Session problems that a fresh login fixes.
    Auth,

    /// Backend errors (HTTP 5xx). Transient.
    Server,

    /// Rejected input, e.g. wrong password or duplicate email.
    User,

    /// Local filesystem or storage failures.
    System,

    /// Missing or invalid settings.
    Configuration,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::User => "user",
            ErrorCategory::System => "system",
            ErrorCategory::Configuration => "configuration",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check that the AI Meals backend is reachable and try again",
            ErrorCategory::Auth => "Run `aimeals login <email>` to sign in again",
            ErrorCategory::Server => "The server may be experiencing issues. Please try again later",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
            ErrorCategory::Configuration => "Check the AIMEALS_* environment variables",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
