//! Route guard for protected views.
//!
//! A guard starts out `Validating` and renders a loading state until
//! [`RouteGuard::validate`] resolves it to `Valid` (render the protected
//! view) or `Invalid` (redirect to the login view). It goes back to
//! `Validating` whenever the authenticated flag or the access token it last
//! saw changes.

use tracing::{debug, info};

use super::session::SessionContext;

/// Path of the login view.
pub const DEFAULT_LOGIN_PATH: &str = "/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardState {
    Validating,
    Valid,
    Invalid,
}

/// What the protected view should render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderDecision {
    Loading,
    Children,
    Redirect { to: String },
}

/// The slice of the credential record the guard watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ObservedAuth {
    is_authenticated: bool,
    access_token: Option<String>,
}

impl ObservedAuth {
    async fn read(session: &SessionContext) -> Self {
        let record = session.store().snapshot().await;
        Self {
            is_authenticated: record.is_authenticated,
            access_token: record.access_token,
        }
    }
}

#[derive(Debug)]
pub struct RouteGuard {
    session: SessionContext,
    login_path: String,
    state: GuardState,
    observed: ObservedAuth,
}

impl RouteGuard {
    /// Mount a guard. It starts in `Validating`.
    pub async fn mount(session: SessionContext, login_path: impl Into<String>) -> Self {
        let observed = ObservedAuth::read(&session).await;
        Self {
            session,
            login_path: login_path.into(),
            state: GuardState::Validating,
            observed,
        }
    }

    pub fn state(&self) -> GuardState {
        self.state
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Render decision for the current state.
    pub fn decision(&self) -> RenderDecision {
        match self.state {
            GuardState::Validating => RenderDecision::Loading,
            GuardState::Valid => RenderDecision::Children,
            GuardState::Invalid => RenderDecision::Redirect {
                to: self.login_path.clone(),
            },
        }
    }

    /// Re-read the credential record. Returns `true` (and goes back to
    /// `Validating`) if the flag or access token changed.
    pub async fn observe(&mut self) -> bool {
        let current = ObservedAuth::read(&self.session).await;
        if current == self.observed {
            return false;
        }
        debug!("Credential record changed, revalidating");
        self.observed = current;
        self.state = GuardState::Validating;
        true
    }

    /// Resolve a `Validating` guard. A resolved guard is returned as-is.
    ///
    /// The credential record is re-read once validation finishes, so token
    /// changes made by validation itself (a refresh inside
    /// [`SessionContext::check_auth_state`], or the logout of a rejected
    /// session) do not send the guard back to `Validating`. The rotated
    /// token was already confirmed by that same check; only changes made
    /// elsewhere are picked up by [`RouteGuard::observe`].
    pub async fn validate(&mut self) -> RenderDecision {
        if self.state != GuardState::Validating {
            return self.decision();
        }

        let record = self.session.store().snapshot().await;
        self.state = if !record.is_authenticated || !record.has_access_token() {
            debug!("Route guard: no local session");
            GuardState::Invalid
        } else if self.session.check_auth_state().await.is_authenticated() {
            GuardState::Valid
        } else {
            info!("Route guard: session rejected, logging out");
            self.session.logout().await;
            GuardState::Invalid
        };

        self.observed = ObservedAuth::read(&self.session).await;
        self.decision()
    }
}
