//! Session re-validation at startup.
//!
//! A persisted session is only trusted after the backend confirms it. The
//! initializer runs once before any command touches a protected resource.

use tracing::{debug, info};

use crate::auth::session::{AuthState, SessionContext};

/// Re-validate the persisted session.
///
/// Nothing happens unless the record says a login occurred. A confirmed
/// session is written back through the login path with the fresh profile;
/// anything else logs out.
pub async fn initialize_session(session: &SessionContext) -> AuthState {
    if !session.store().is_authenticated().await {
        debug!("No persisted login, skipping session check");
        return AuthState::Unauthenticated;
    }

    let state = session.check_auth_state().await;
    match &state {
        AuthState::Authenticated { user, tokens } => {
            session.store().login(tokens.clone(), user.clone()).await;
            info!(user_id = %user.id, "Restored session");
        }
        AuthState::Unauthenticated => {
            info!("Persisted session is no longer valid, logging out");
            session.logout().await;
        }
    }
    state
}
