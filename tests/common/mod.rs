//! Common test utilities for integration tests.
//!
//! Token builders produce unsigned JWT-shaped strings; only the payload's
//! `exp` claim matters to the client. Session builders wire a
//! [`SessionContext`] to a wiremock server and in-memory storage.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use aimeals::adapters::{InMemoryStorage, ReqwestHttpClient};
use aimeals::auth::credentials::AUTH_KEY;
use aimeals::auth::{CredentialRecord, SessionContext, TokenPair, User};
use aimeals::startup::{build_session_with, AppConfig};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde_json::json;
use wiremock::MockServer;

static TOKEN_SEQ: AtomicU64 = AtomicU64::new(1);

/// Build an unsigned token whose `exp` is `exp_offset_secs` from now.
///
/// Every token carries a distinct `jti`, so two tokens with the same
/// expiry still compare unequal.
pub fn token_expiring_in(exp_offset_secs: i64) -> String {
    let exp = chrono::Utc::now().timestamp() + exp_offset_secs;
    let jti = TOKEN_SEQ.fetch_add(1, Ordering::Relaxed);
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(json!({ "sub": "42", "exp": exp, "jti": jti }).to_string());
    format!("{}.{}.signature", header, payload)
}

/// A token valid for the next half hour.
pub fn valid_token() -> String {
    token_expiring_in(1800)
}

/// A token that expired a second ago.
pub fn expired_token() -> String {
    token_expiring_in(-1)
}

pub fn test_user() -> User {
    User {
        id: "42".to_string(),
        email: "cook@example.com".to_string(),
        first_name: "Ada".to_string(),
        last_name: "Cook".to_string(),
    }
}

/// JSON body the backend returns from `/auth/me` for [`test_user`].
pub fn me_body() -> serde_json::Value {
    json!({
        "id": 42,
        "email": "cook@example.com",
        "first_name": "Ada",
        "last_name": "Cook"
    })
}

/// A persisted record holding the given tokens for [`test_user`].
pub fn signed_in_record(access: &str, refresh: Option<&str>) -> CredentialRecord {
    CredentialRecord {
        access_token: Some(access.to_string()),
        refresh_token: refresh.map(str::to_string),
        is_authenticated: true,
        user: Some(test_user()),
    }
}

/// Storage pre-populated with `record` under the auth key.
pub fn storage_with(record: &CredentialRecord) -> InMemoryStorage {
    let raw = serde_json::to_string(record).expect("record serializes");
    InMemoryStorage::with_items([(AUTH_KEY, raw.as_str())])
}

pub fn config_for(server: &MockServer) -> AppConfig {
    AppConfig::new()
        .with_api_base_url(server.uri())
        .with_request_timeout(Duration::from_secs(5))
}

/// A session over real HTTP against `server`, loaded from `storage`.
pub async fn session_for(server: &MockServer, storage: InMemoryStorage) -> SessionContext {
    session_with_config(&config_for(server), storage).await
}

pub async fn session_with_config(config: &AppConfig, storage: InMemoryStorage) -> SessionContext {
    let http = ReqwestHttpClient::new().with_default_timeout(config.request_timeout);
    build_session_with(config, Arc::new(http), Arc::new(storage)).await
}

/// Login response body as the backend sends it.
pub fn token_body(tokens: &TokenPair) -> serde_json::Value {
    json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "token_type": "bearer",
        "user_id": 42
    })
}
