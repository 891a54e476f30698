//! Credential store for the AI Meals session.
//!
//! The store holds the current token pair, the local "logged in" flag and a
//! cached profile. It is the only shared mutable state in the session core
//! and is written only through [`CredentialStore::login`],
//! [`CredentialStore::update_tokens`], [`CredentialStore::clear_tokens`],
//! [`CredentialStore::clear_tokens_from`] and
//! [`CredentialStore::logout`]. Every mutation is written through to the
//! backing [`KeyValueStore`] so a restarted process resumes the session.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::traits::{KeyValueStore, StorageError};

/// Storage key of the serialized [`CredentialRecord`].
pub const AUTH_KEY: &str = "auth";

/// Legacy storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Legacy storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Cached profile of the signed-in user.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    /// Backend user id, stringified.
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

/// An access/refresh token pair as issued by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Snapshot of the credential state.
///
/// `is_authenticated` only records that a login happened; it says nothing
/// about whether the access token is still valid.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CredentialRecord {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
    pub user: Option<User>,
}

impl CredentialRecord {
    /// Both tokens, if both are present.
    pub fn tokens(&self) -> Option<TokenPair> {
        match (&self.access_token, &self.refresh_token) {
            (Some(access), Some(refresh)) => Some(TokenPair::new(access, refresh)),
            _ => None,
        }
    }

    pub fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Process-wide credential store backed by persisted storage.
pub struct CredentialStore {
    record: RwLock<CredentialRecord>,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore").finish_non_exhaustive()
    }
}

impl CredentialStore {
    /// Create an empty store over `storage` without reading it.
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            record: RwLock::new(CredentialRecord::default()),
            storage,
        }
    }

    /// Create a store from the record persisted in `storage`.
    ///
    /// A missing or unreadable record yields an empty store.
    pub async fn load(storage: Arc<dyn KeyValueStore>) -> Self {
        let record = match storage.get_item(AUTH_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<CredentialRecord>(&raw) {
                Ok(record) => record,
                Err(e) => {
                    warn!(error = %e, "Discarding unreadable credential record");
                    CredentialRecord::default()
                }
            },
            Ok(None) => CredentialRecord::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read credential record");
                CredentialRecord::default()
            }
        };
        debug!(
            is_authenticated = record.is_authenticated,
            has_access_token = record.has_access_token(),
            "Loaded credential record"
        );
        Self {
            record: RwLock::new(record),
            storage,
        }
    }

    /// Copy of the current record.
    pub async fn snapshot(&self) -> CredentialRecord {
        self.record.read().await.clone()
    }

    pub async fn access_token(&self) -> Option<String> {
        self.record.read().await.access_token.clone()
    }

    pub async fn refresh_token(&self) -> Option<String> {
        self.record.read().await.refresh_token.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.record.read().await.is_authenticated
    }

    pub async fn user(&self) -> Option<User> {
        self.record.read().await.user.clone()
    }

    /// Record a completed login.
    pub async fn login(&self, tokens: TokenPair, user: User) {
        let mut record = self.record.write().await;
        *record = CredentialRecord {
            access_token: Some(tokens.access_token),
            refresh_token: Some(tokens.refresh_token),
            is_authenticated: true,
            user: Some(user),
        };
        self.persist(&record).await;
    }

    /// Replace both tokens after `rotated_from` was exchanged for `tokens`.
    /// The legacy entries are written alongside the record.
    ///
    /// Returns `false` and changes nothing if the stored refresh token is no
    /// longer `rotated_from`, i.e. a logout or another login happened while
    /// the exchange was in flight.
    pub async fn update_tokens(&self, rotated_from: &str, tokens: TokenPair) -> bool {
        let mut record = self.record.write().await;
        if record.refresh_token.as_deref() != Some(rotated_from) {
            debug!("Refresh token changed during exchange, discarding new pair");
            return false;
        }
        self.write_legacy(ACCESS_TOKEN_KEY, &tokens.access_token).await;
        self.write_legacy(REFRESH_TOKEN_KEY, &tokens.refresh_token).await;
        record.access_token = Some(tokens.access_token);
        record.refresh_token = Some(tokens.refresh_token);
        self.persist(&record).await;
        true
    }

    /// [`clear_tokens`](Self::clear_tokens), but only while `refresh_token`
    /// is still the stored one.
    pub async fn clear_tokens_from(&self, refresh_token: &str) -> bool {
        let mut record = self.record.write().await;
        if record.refresh_token.as_deref() != Some(refresh_token) {
            return false;
        }
        Self::drop_tokens(&mut record);
        self.remove_legacy().await;
        self.persist(&record).await;
        true
    }

    /// Drop both tokens. The user and the authenticated flag are kept;
    /// a later guard validation finds no token and logs out.
    pub async fn clear_tokens(&self) {
        let mut record = self.record.write().await;
        Self::drop_tokens(&mut record);
        self.remove_legacy().await;
        self.persist(&record).await;
    }

    /// Clear everything.
    pub async fn logout(&self) {
        let mut record = self.record.write().await;
        *record = CredentialRecord::default();
        self.remove_legacy().await;
        if let Err(e) = self.storage.remove_item(AUTH_KEY).await {
            warn!(error = %e, "Failed to remove persisted credential record");
        }
    }

    /// Tokens from the legacy entries, read straight from storage.
    pub async fn legacy_tokens(&self) -> Result<(Option<String>, Option<String>), StorageError> {
        let access = self.storage.get_item(ACCESS_TOKEN_KEY).await?;
        let refresh = self.storage.get_item(REFRESH_TOKEN_KEY).await?;
        Ok((access, refresh))
    }

    fn drop_tokens(record: &mut CredentialRecord) {
        record.access_token = None;
        record.refresh_token = None;
    }

    async fn persist(&self, record: &CredentialRecord) {
        let raw = match serde_json::to_string(record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to serialize credential record");
                return;
            }
        };
        if let Err(e) = self.storage.set_item(AUTH_KEY, &raw).await {
            warn!(error = %e, "Failed to persist credential record");
        }
    }

    async fn write_legacy(&self, key: &str, value: &str) {
        if let Err(e) = self.storage.set_item(key, value).await {
            warn!(key, error = %e, "Failed to persist token");
        }
    }

    async fn remove_legacy(&self) {
        for key in [ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY] {
            if let Err(e) = self.storage.remove_item(key).await {
                warn!(key, error = %e, "Failed to remove persisted token");
            }
        }
    }
}
