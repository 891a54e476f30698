//! Command handlers.
//!
//! Each handler takes an already-built session (or API client) so it can be
//! driven against mocks in tests. Only password prompts touch the terminal
//! directly.

use chrono::{DateTime, Utc};
use std::io::{self, Write};
use tracing::{debug, warn};

use crate::auth::api::{AuthApi, NewAccount};
use crate::auth::credentials::{CredentialRecord, User};
use crate::auth::guard::{RenderDecision, RouteGuard};
use crate::auth::request::RequestOptions;
use crate::auth::session::{AuthState, SessionContext};
use crate::auth::token;
use crate::error::{AppError, AppResult, AuthError};
use crate::startup::initialize_session;
use crate::traits::{HttpError, Method, Response};

/// Prompt for a password without echo.
pub fn prompt_password(prompt: &str) -> AppResult<String> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let password = rpassword::read_password()?;
    Ok(password)
}

fn describe_user(user: &User) -> String {
    let name = format!("{} {}", user.first_name, user.last_name);
    let name = name.trim();
    if name.is_empty() {
        format!("<{}> (id {})", user.email, user.id)
    } else {
        format!("{} <{}> (id {})", name, user.email, user.id)
    }
}

fn describe_token(label: &str, token: Option<&str>, now: DateTime<Utc>) -> String {
    let Some(raw) = token else {
        return format!("{}: none", label);
    };
    match token::expires_at(raw) {
        Some(at) if token::is_expired_at(Some(raw), now.timestamp_millis()) => {
            format!("{}: expired at {}", label, at.to_rfc3339())
        }
        Some(at) => format!("{}: valid until {}", label, at.to_rfc3339()),
        None => format!("{}: unreadable", label),
    }
}

/// Local view of the stored session. Makes no network calls.
pub fn format_status(record: &CredentialRecord, now: DateTime<Utc>) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "Signed in: {}",
        if record.is_authenticated { "yes" } else { "no" }
    ));
    if let Some(user) = &record.user {
        lines.push(format!("User: {}", describe_user(user)));
    }
    lines.push(describe_token("Access token", record.access_token.as_deref(), now));
    lines.push(format!(
        "Refresh token: {}",
        if record.refresh_token.is_some() { "stored" } else { "none" }
    ));
    lines.join("\n")
}

/// Absolute URL for a `fetch` path: full URLs pass through, anything else
/// is resolved under the versioned API.
pub fn resolve_fetch_url(api: &AuthApi, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        path.to_string()
    } else {
        api.api_url(path)
    }
}

pub async fn login(session: &SessionContext, email: &str, password: &str) -> AppResult<User> {
    let user = session.login(email, password).await?;
    println!("Logged in as {}", describe_user(&user));
    Ok(user)
}

pub async fn signup(session: &SessionContext, account: NewAccount) -> AppResult<User> {
    // Reachability only; signup still goes ahead so the real error surfaces.
    match session.api().health().await {
        Ok(status) if (200..300).contains(&status) => debug!(status, "Backend healthy"),
        Ok(status) => warn!(status, "Backend health check returned an error status"),
        Err(e) => warn!(error = %e, "Backend health check failed"),
    }

    let user = session.signup(account).await?;
    println!("Account created. Logged in as {}", describe_user(&user));
    Ok(user)
}

pub async fn logout(session: &SessionContext) {
    session.logout().await;
    println!("Logged out");
}

pub async fn status(session: &SessionContext) {
    let record = session.store().snapshot().await;
    println!("{}", format_status(&record, Utc::now()));
}

/// Re-validate the stored session with the backend and print the user.
pub async fn whoami(session: &SessionContext) -> AppResult<User> {
    match initialize_session(session).await {
        AuthState::Authenticated { user, .. } => {
            println!("{}", describe_user(&user));
            Ok(user)
        }
        AuthState::Unauthenticated => Err(AuthError::NotAuthenticated.into()),
    }
}

/// Call a protected path behind the route guard.
pub async fn fetch(
    session: &SessionContext,
    login_path: &str,
    path: &str,
    method: Method,
    data: Option<String>,
) -> AppResult<Response> {
    let mut guard = RouteGuard::mount(session.clone(), login_path).await;
    if let RenderDecision::Redirect { to } = guard.validate().await {
        eprintln!("Sign-in required (redirect to {})", to);
        return Err(AuthError::NotAuthenticated.into());
    }

    let url = resolve_fetch_url(session.api(), path);
    let mut options = RequestOptions::new()
        .method(method)
        .timeout(session.api().timeout());
    if let Some(body) = data {
        options = options.json_body(body);
    }

    let response = session.request(&url, options).await?;
    let body = response.text().unwrap_or_default();
    if !response.is_success() {
        return Err(AppError::Http(HttpError::ServerError {
            status: response.status,
            message: body,
        }));
    }
    println!("{}", body);
    Ok(response)
}

pub async fn health(api: &AuthApi) -> AppResult<u16> {
    let status = api.health().await?;
    if (200..300).contains(&status) {
        println!("{} is healthy ({})", api.base_url(), status);
        Ok(status)
    } else {
        Err(AppError::Http(HttpError::ServerError {
            status,
            message: format!("{}/health", api.base_url()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{InMemoryStorage, MockHttpClient, MockResponse};
    use crate::auth::credentials::{CredentialStore, TokenPair};
    use crate::auth::token::encode_unsigned;
    use chrono::TimeZone;
    use serde_json::json;
    use std::sync::Arc;

    fn session(mock: &MockHttpClient) -> SessionContext {
        let store = CredentialStore::new(Arc::new(InMemoryStorage::new()));
        SessionContext::new(AuthApi::new("http://api.test", Arc::new(mock.clone())), store)
    }

    #[test]
    fn test_format_status_signed_out() {
        let text = format_status(&CredentialRecord::default(), Utc::now());
        assert_eq!(text, "Signed in: no\nAccess token: none\nRefresh token: none");
    }

    #[test]
    fn test_format_status_expired_token() {
        let now = Utc.timestamp_opt(2_000, 0).unwrap();
        let record = CredentialRecord {
            access_token: Some(encode_unsigned(&json!({ "exp": 1_000 }))),
            refresh_token: Some("r".to_string()),
            is_authenticated: true,
            user: Some(User {
                id: "7".to_string(),
                email: "cook@example.com".to_string(),
                first_name: "Ada".to_string(),
                last_name: "Cook".to_string(),
            }),
        };

        let text = format_status(&record, now);

        assert!(text.contains("Signed in: yes"));
        assert!(text.contains("User: Ada Cook <cook@example.com> (id 7)"));
        assert!(text.contains("Access token: expired at 1970-01-01T00:16:40+00:00"));
        assert!(text.contains("Refresh token: stored"));
    }

    #[test]
    fn test_resolve_fetch_url() {
        let api = AuthApi::new("http://api.test", Arc::new(MockHttpClient::new()));
        assert_eq!(resolve_fetch_url(&api, "/meal-plans"), "http://api.test/api/v1/meal-plans");
        assert_eq!(resolve_fetch_url(&api, "https://cdn.test/x"), "https://cdn.test/x");
    }

    #[tokio::test]
    async fn test_fetch_redirects_without_session() {
        let mock = MockHttpClient::new();
        let err = fetch(&session(&mock), "/auth", "/meal-plans", Method::Get, None)
            .await
            .unwrap_err();

        assert!(err.requires_reauth());
        assert!(mock.get_requests().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_sends_bearer_after_guard() {
        let mock = MockHttpClient::new();
        mock.set_response(
            "http://api.test/api/v1/auth/me",
            MockResponse::json(200, json!({ "id": 1, "email": "a@b.c" })),
        );
        mock.set_response(
            "http://api.test/api/v1/meal-plans",
            MockResponse::json(200, json!([{ "id": 1 }])),
        );
        let session = session(&mock);
        let access = encode_unsigned(&json!({ "exp": Utc::now().timestamp() + 600 }));
        session
            .store()
            .login(TokenPair::new(&access, "r"), User::default())
            .await;

        let response = fetch(&session, "/auth", "/meal-plans", Method::Get, None)
            .await
            .unwrap();

        assert_eq!(response.status, 200);
        let call = &mock.requests_to("http://api.test/api/v1/meal-plans")[0];
        assert_eq!(call.authorization(), Some(format!("Bearer {}", access).as_str()));
    }

    #[tokio::test]
    async fn test_whoami_without_session() {
        let mock = MockHttpClient::new();
        let err = whoami(&session(&mock)).await.unwrap_err();
        assert!(matches!(err, AppError::Auth(AuthError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_health_error_status() {
        let mock = MockHttpClient::new();
        mock.set_response("http://api.test/health", MockResponse::status(503));
        let api = AuthApi::new("http://api.test", Arc::new(mock));

        let err = health(&api).await.unwrap_err();
        assert!(err.is_retryable());
    }
}
