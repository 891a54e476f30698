//! Session context: token refresh, session validation and the login paths.
//!
//! [`SessionContext`] is the injectable handle every consumer of the session
//! shares. It owns the [`CredentialStore`] and the [`AuthApi`] and is cheap
//! to clone.
//!
//! Refresh is single-flight: while one exchange of the refresh token is in
//! flight, every other caller awaits the same shared future instead of
//! sending its own request, and all of them observe the same outcome.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::api::{AuthApi, NewAccount};
use super::credentials::{CredentialStore, TokenPair, User};
use super::token;
use crate::error::AuthError;

/// Fallback names used when the profile cannot be fetched after login.
const FALLBACK_FIRST_NAME: &str = "User";
const FALLBACK_LAST_NAME: &str = "Name";

type RefreshFuture = Shared<BoxFuture<'static, bool>>;

/// Verdict of [`SessionContext::check_auth_state`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Authenticated { user: User, tokens: TokenPair },
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, AuthState::Authenticated { .. })
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            AuthState::Authenticated { user, .. } => Some(user),
            AuthState::Unauthenticated => None,
        }
    }

    pub fn tokens(&self) -> Option<&TokenPair> {
        match self {
            AuthState::Authenticated { tokens, .. } => Some(tokens),
            AuthState::Unauthenticated => None,
        }
    }
}

struct SessionInner {
    api: AuthApi,
    store: CredentialStore,
    refresh_slot: Mutex<Option<RefreshFuture>>,
}

/// Shared handle to the session.
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("api", &self.inner.api)
            .finish_non_exhaustive()
    }
}

impl SessionContext {
    pub fn new(api: AuthApi, store: CredentialStore) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                api,
                store,
                refresh_slot: Mutex::new(None),
            }),
        }
    }

    pub fn api(&self) -> &AuthApi {
        &self.inner.api
    }

    pub fn store(&self) -> &CredentialStore {
        &self.inner.store
    }

    /// Exchange the stored refresh token for a new pair.
    ///
    /// Returns `false` without touching the network when no refresh token
    /// is stored. Any failure clears the stored tokens. Concurrent callers
    /// share one request. If a logout or another login replaces the stored
    /// refresh token while the exchange is in flight, its result is dropped
    /// and `false` is returned.
    pub async fn refresh(&self) -> bool {
        let shared = {
            let mut slot = self.inner.refresh_slot.lock().await;
            match slot.as_ref() {
                Some(in_flight) => {
                    debug!("Joining in-flight token refresh");
                    in_flight.clone()
                }
                None => {
                    let session = self.clone();
                    let fut: RefreshFuture = async move {
                        let refreshed = session.refresh_once().await;
                        session.inner.refresh_slot.lock().await.take();
                        refreshed
                    }
                    .boxed()
                    .shared();
                    *slot = Some(fut.clone());
                    fut
                }
            }
        };
        shared.await
    }

    async fn refresh_once(&self) -> bool {
        let Some(refresh_token) = self.inner.store.refresh_token().await else {
            debug!("No refresh token stored, skipping refresh");
            return false;
        };

        debug!("Refreshing access token");
        match self.inner.api.refresh(&refresh_token).await {
            Ok(tokens) => {
                if self.inner.store.update_tokens(&refresh_token, tokens).await {
                    info!("Access token refreshed");
                    true
                } else {
                    info!("Session changed during token refresh, dropping result");
                    false
                }
            }
            Err(e) => {
                warn!(error = %e, "Token refresh failed, clearing tokens");
                self.inner.store.clear_tokens_from(&refresh_token).await;
                false
            }
        }
    }

    /// Decide whether the stored session is valid, confirming it with the
    /// backend.
    ///
    /// An expired access token is refreshed at most once; the refreshed
    /// token then goes through the same checks, including `/auth/me`.
    /// Every failure clears the stored tokens.
    pub async fn check_auth_state(&self) -> AuthState {
        let mut refreshed = false;
        loop {
            let Some(tokens) = self.inner.store.snapshot().await.tokens() else {
                debug!("Session check: tokens missing");
                return AuthState::Unauthenticated;
            };

            if token::is_expired(Some(&tokens.access_token)) {
                if refreshed {
                    warn!("Refreshed access token is already expired");
                    self.inner.store.clear_tokens().await;
                    return AuthState::Unauthenticated;
                }
                debug!("Session check: access token expired");
                if !self.refresh().await {
                    self.inner.store.clear_tokens().await;
                    return AuthState::Unauthenticated;
                }
                refreshed = true;
                continue;
            }

            return match self.inner.api.me(&tokens.access_token).await {
                Ok(user) => {
                    debug!(user_id = %user.id, "Session check: authenticated");
                    AuthState::Authenticated { user, tokens }
                }
                Err(e) => {
                    warn!(error = %e, "Session check failed, clearing tokens");
                    self.inner.store.clear_tokens().await;
                    AuthState::Unauthenticated
                }
            };
        }
    }

    /// Sign in with email and password and populate the store.
    ///
    /// The profile comes from `/auth/me`; if that call fails the user is
    /// built from the login response and the submitted email.
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let response = self
            .inner
            .api
            .login(email, password)
            .await
            .map_err(|e| AuthError::login_rejected(e, "Invalid credentials"))?;
        let tokens = response.tokens();

        let user = match self.inner.api.me(&tokens.access_token).await {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "Profile fetch after login failed, using fallback profile");
                User {
                    id: response.user_id.clone().unwrap_or_default(),
                    email: email.to_string(),
                    first_name: FALLBACK_FIRST_NAME.to_string(),
                    last_name: FALLBACK_LAST_NAME.to_string(),
                }
            }
        };

        self.inner.store.login(tokens, user.clone()).await;
        info!(user_id = %user.id, "Logged in");
        Ok(user)
    }

    /// Register an account, then sign in with it.
    pub async fn signup(&self, account: NewAccount) -> Result<User, AuthError> {
        self.inner
            .api
            .register(&account)
            .await
            .map_err(|e| AuthError::signup_rejected(e, "Signup failed"))?;
        debug!("Account registered, logging in");

        let response = self
            .inner
            .api
            .login(&account.email, &account.password)
            .await
            .map_err(|e| AuthError::login_rejected(e, "Login after signup failed"))?;

        let user = User {
            id: response.user_id.clone().unwrap_or_default(),
            email: account.email,
            first_name: account.first_name,
            last_name: account.last_name,
        };
        self.inner.store.login(response.tokens(), user.clone()).await;
        info!(user_id = %user.id, "Signed up");
        Ok(user)
    }

    /// Forget the session entirely.
    pub async fn logout(&self) {
        self.inner.store.logout().await;
        info!("Logged out");
    }
}
