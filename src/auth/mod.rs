//! Session and authentication core for the AI Meals client.
//!
//! - Credential store persisted through [`crate::traits::KeyValueStore`]
//! - Token expiry inspection
//! - Auth API client for login, signup, profile and refresh
//! - Single-flight token refresh and session validation
//! - Authenticated request wrapper and route guard

pub mod api;
pub mod credentials;
pub mod guard;
pub mod request;
pub mod session;
pub mod token;

pub use api::{ApiError, AuthApi, NewAccount};
pub use credentials::{CredentialRecord, CredentialStore, TokenPair, User};
pub use guard::{GuardState, RenderDecision, RouteGuard, DEFAULT_LOGIN_PATH};
pub use request::{RequestError, RequestOptions};
pub use session::{AuthState, SessionContext};
pub use token::{is_expired, is_expired_at};
