//! Error handling for the AI Meals client.
//!
//! - **Error Categories**: High-level classification for handling decisions
//! - **Auth Errors**: Login, signup and session failures with user messages
//! - **Unified Error Type**: `AppError` consolidates the domain errors
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Connection, timeout | Yes |
//! | Auth | Session expired or missing | No |
//! | Server | Backend errors (5xx) | Yes |
//! | User | Rejected input | No |
//! | System | Local storage errors | No |
//! | Configuration | Bad settings | No |

mod app_error;
mod auth;
mod category;

pub use app_error::AppError;
pub use auth::AuthError;
pub use category::ErrorCategory;

/// Result alias used by the CLI command handlers.
pub type AppResult<T> = Result<T, AppError>;
