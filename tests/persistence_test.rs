//! Cold-start persistence through the file-backed store.

mod common;

use std::sync::Arc;

use aimeals::adapters::{FileStorage, MockHttpClient, MockResponse};
use aimeals::auth::credentials::{ACCESS_TOKEN_KEY, AUTH_KEY, REFRESH_TOKEN_KEY};
use aimeals::auth::{AuthState, TokenPair};
use aimeals::startup::{build_session, build_session_with, initialize_session, AppConfig};
use aimeals::traits::KeyValueStore;
use common::*;
use tempfile::TempDir;

const BASE: &str = "http://api.test";

fn config(dir: &TempDir) -> AppConfig {
    AppConfig::new()
        .with_api_base_url(BASE)
        .with_data_dir(dir.path())
}

async fn session_in(dir: &TempDir, mock: &MockHttpClient) -> aimeals::auth::SessionContext {
    build_session_with(
        &config(dir),
        Arc::new(mock.clone()),
        Arc::new(FileStorage::in_dir(dir.path())),
    )
    .await
}

#[tokio::test]
async fn test_login_survives_restart() {
    let dir = TempDir::new().unwrap();
    let mock = MockHttpClient::new();
    let tokens = TokenPair::new(valid_token(), "r1");
    mock.set_response(
        "http://api.test/api/v1/auth/login",
        MockResponse::json(200, token_body(&tokens)),
    );
    mock.set_response("http://api.test/api/v1/auth/me", MockResponse::json(200, me_body()));

    let first = session_in(&dir, &mock).await;
    first.login("cook@example.com", "secret").await.unwrap();
    drop(first);

    let second = session_in(&dir, &mock).await;
    let record = second.store().snapshot().await;
    assert!(record.is_authenticated);
    assert_eq!(record.tokens(), Some(tokens.clone()));
    assert_eq!(record.user, Some(test_user()));

    assert_eq!(initialize_session(&second).await, AuthState::Authenticated {
        user: test_user(),
        tokens,
    });
}

#[tokio::test]
async fn test_legacy_keys_mirror_tokens() {
    let dir = TempDir::new().unwrap();
    let mock = MockHttpClient::new();
    let session = session_in(&dir, &mock).await;

    session
        .store()
        .login(TokenPair::new("access-0", "refresh-0"), test_user())
        .await;
    assert!(
        session
            .store()
            .update_tokens("refresh-0", TokenPair::new("access-1", "refresh-1"))
            .await
    );

    let storage = FileStorage::in_dir(dir.path());
    assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).await.unwrap(), Some("access-1".to_string()));
    assert_eq!(storage.get_item(REFRESH_TOKEN_KEY).await.unwrap(), Some("refresh-1".to_string()));
    assert_eq!(
        session.store().legacy_tokens().await.unwrap(),
        (Some("access-1".to_string()), Some("refresh-1".to_string()))
    );
}

#[tokio::test]
async fn test_logout_removes_persisted_record() {
    let dir = TempDir::new().unwrap();
    let mock = MockHttpClient::new();
    let session = session_in(&dir, &mock).await;
    session
        .store()
        .login(TokenPair::new(valid_token(), "r1"), test_user())
        .await;

    session.logout().await;

    let storage = FileStorage::in_dir(dir.path());
    assert_eq!(storage.get_item(AUTH_KEY).await.unwrap(), None);
    assert_eq!(storage.get_item(ACCESS_TOKEN_KEY).await.unwrap(), None);

    let reloaded = session_in(&dir, &mock).await;
    assert!(reloaded.store().snapshot().await.is_empty());
}

#[tokio::test]
async fn test_corrupt_record_starts_signed_out() {
    let dir = TempDir::new().unwrap();
    let storage = FileStorage::in_dir(dir.path());
    storage.set_item(AUTH_KEY, "{not json").await.unwrap();

    let session = session_in(&dir, &MockHttpClient::new()).await;

    assert!(!session.store().is_authenticated().await);
    assert_eq!(session.store().access_token().await, None);
}

#[tokio::test]
async fn test_build_session_uses_configured_data_dir() {
    let dir = TempDir::new().unwrap();
    let session = build_session(&config(&dir)).await.unwrap();

    session
        .store()
        .login(TokenPair::new("a", "r"), test_user())
        .await;

    assert!(dir.path().join("storage.json").exists());
    assert_eq!(session.api().base_url(), BASE);
}
