//! Startup wiring with dependency injection.
//!
//! # Components
//!
//! - [`config`] - Configuration from the environment
//! - [`auth`] - Session re-validation at startup
//!
//! # Usage
//!
//! ```ignore
//! use aimeals::startup::{build_session, initialize_session, AppConfig};
//!
//! let config = AppConfig::from_env()?;
//! let session = build_session(&config).await?;
//! let state = initialize_session(&session).await;
//! ```

pub mod auth;
pub mod config;

use std::sync::Arc;

use crate::adapters::{FileStorage, ReqwestHttpClient};
use crate::auth::{AuthApi, CredentialStore, SessionContext};
use crate::error::AppError;
use crate::traits::{HttpClient, KeyValueStore};

pub use auth::initialize_session;
pub use config::{AppConfig, ConfigError};

/// Build a session from injected collaborators, loading the persisted record.
pub async fn build_session_with(
    config: &AppConfig,
    http: Arc<dyn HttpClient>,
    storage: Arc<dyn KeyValueStore>,
) -> SessionContext {
    let api = AuthApi::new(&config.api_base_url, http).with_timeout(config.request_timeout);
    let store = CredentialStore::load(storage).await;
    SessionContext::new(api, store)
}

/// Build the production session: reqwest transport and file storage.
pub async fn build_session(config: &AppConfig) -> Result<SessionContext, AppError> {
    let data_dir = config.resolved_data_dir()?;
    let http = ReqwestHttpClient::new().with_default_timeout(config.request_timeout);
    let storage = FileStorage::in_dir(data_dir);
    Ok(build_session_with(config, Arc::new(http), Arc::new(storage)).await)
}
