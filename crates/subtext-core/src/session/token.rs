//! Credential expiry tracking and single-flight refresh.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use super::error::{SessionError, SessionResult};
use super::store::SessionStore;
use crate::api::ApiClient;

/// A token is treated as expired this many seconds before its actual expiry,
/// so in-flight requests never ride on a token about to die.
pub const EXPIRY_BUFFER_SECS: i64 = 5 * 60;

/// Stored bearer credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Expiry as Unix timestamp in seconds. Absent means unknown, which is
    /// treated as already expired.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Credential {
    /// Whether the access token is expired (or within the refresh buffer)
    /// at the given instant.
    pub fn is_expired_at(&self, now: i64) -> bool {
        match self.expires_at {
            Some(expires_at) => now >= expires_at - EXPIRY_BUFFER_SECS,
            None => true,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

/// What [`TokenLifecycle::ensure_fresh`] hands back to callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialState {
    /// A token valid for at least the buffer window.
    Fresh(Credential),
    /// No credential, or no way to renew one. Not an error by itself.
    Unauthenticated,
}

/// Shared result of one refresh round-trip.
#[derive(Debug, Clone)]
enum RefreshOutcome {
    Refreshed(Credential),
    /// 4xx from the refresh route. The credential has been destroyed.
    Terminal(String),
    /// Network or 5xx failure. The credential is left intact.
    Transient(String),
}

type SharedRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Keeps the stored credential fresh.
///
/// Concurrent callers needing a refresh join a single in-flight request
/// rather than each hitting the refresh route. The epoch counter is bumped
/// whenever the session is replaced or destroyed, so a refresh that settles
/// after a logout cannot resurrect the cleared credential.
pub struct TokenLifecycle {
    store: Arc<SessionStore>,
    api: ApiClient,
    epoch: Arc<AtomicU64>,
    pending: Mutex<Option<SharedRefresh>>,
}

impl TokenLifecycle {
    pub fn new(store: Arc<SessionStore>, api: ApiClient) -> Self {
        Self {
            store,
            api,
            epoch: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
        }
    }

    /// Current session epoch. Bumped on login, logout, and forced teardown.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Invalidates any refresh still in flight for the previous session.
    pub fn bump_epoch(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
    }

    /// Returns a credential valid for at least the buffer window, refreshing
    /// it first when needed.
    ///
    /// Errors only on refresh failure: terminal (4xx, credential destroyed)
    /// or transient (network/5xx, credential intact, retryable).
    pub async fn ensure_fresh(&self) -> SessionResult<CredentialState> {
        let Some(credential) = self.store.load_credential() else {
            return Ok(CredentialState::Unauthenticated);
        };
        if !credential.is_expired() {
            return Ok(CredentialState::Fresh(credential));
        }
        let Some(refresh_token) = credential.refresh_token.clone() else {
            tracing::warn!("access token expired and no refresh token is stored");
            return Ok(CredentialState::Unauthenticated);
        };

        let refresh = {
            let mut pending = self.pending.lock().await;
            match pending.as_ref() {
                Some(shared) => shared.clone(),
                None => {
                    let shared = run_refresh(
                        self.api.clone(),
                        Arc::clone(&self.store),
                        Arc::clone(&self.epoch),
                        self.epoch(),
                        refresh_token,
                    )
                    .boxed()
                    .shared();
                    *pending = Some(shared.clone());
                    shared
                }
            }
        };

        let outcome = refresh.clone().await;

        // Whichever awaiter observes the settled future clears the slot.
        // The caller that installed it may have been dropped mid-await.
        {
            let mut pending = self.pending.lock().await;
            if pending.as_ref().is_some_and(|inflight| inflight.ptr_eq(&refresh)) {
                *pending = None;
            }
        }

        match outcome {
            RefreshOutcome::Refreshed(credential) => Ok(CredentialState::Fresh(credential)),
            RefreshOutcome::Terminal(message) => Err(SessionError::expired_terminal(message)),
            RefreshOutcome::Transient(message) => Err(SessionError::expired_transient(message)),
        }
    }
}

/// One refresh round-trip. Persists the renewed credential only if the
/// session epoch is unchanged since the refresh started.
async fn run_refresh(
    api: ApiClient,
    store: Arc<SessionStore>,
    epoch: Arc<AtomicU64>,
    started_epoch: u64,
    refresh_token: String,
) -> RefreshOutcome {
    match api.refresh(&refresh_token).await {
        Ok(response) => {
            let Some(session) = response.session.filter(|s| !s.access_token.is_empty()) else {
                return RefreshOutcome::Transient("refresh response had no session".to_string());
            };
            let renewed = Credential {
                access_token: session.access_token,
                // The backend may rotate the refresh token; keep the old one
                // when it doesn't.
                refresh_token: session.refresh_token.or(Some(refresh_token)),
                expires_at: session.expires_at,
            };
            if epoch.load(Ordering::SeqCst) != started_epoch {
                tracing::debug!("session replaced during refresh, discarding result");
                return RefreshOutcome::Transient("session replaced during refresh".to_string());
            }
            store.save_credential(&renewed);
            tracing::debug!("access token refreshed");
            RefreshOutcome::Refreshed(renewed)
        }
        Err(err) if err.is_client_error() => {
            tracing::warn!("refresh rejected: {err}");
            if epoch.load(Ordering::SeqCst) == started_epoch {
                store.clear_session();
            }
            RefreshOutcome::Terminal(format!("Session expired: {err}"))
        }
        Err(err) => {
            tracing::warn!("refresh failed: {err}");
            RefreshOutcome::Transient(format!("Could not refresh session: {err}"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential_expiring_at(expires_at: Option<i64>) -> Credential {
        Credential {
            access_token: "at".to_string(),
            refresh_token: Some("rt".to_string()),
            expires_at,
        }
    }

    /// Test: a token expiring within the buffer counts as expired.
    #[test]
    fn test_expired_within_buffer() {
        let now = 1_700_000_000;
        let credential = credential_expiring_at(Some(now + EXPIRY_BUFFER_SECS));
        assert!(credential.is_expired_at(now));

        let credential = credential_expiring_at(Some(now + 1));
        assert!(credential.is_expired_at(now));

        let credential = credential_expiring_at(Some(now - 100));
        assert!(credential.is_expired_at(now));
    }

    /// Test: a token expiring beyond the buffer is still fresh.
    #[test]
    fn test_fresh_beyond_buffer() {
        let now = 1_700_000_000;
        let credential = credential_expiring_at(Some(now + EXPIRY_BUFFER_SECS + 1));
        assert!(!credential.is_expired_at(now));
    }

    /// Test: an unknown expiry is treated as expired.
    #[test]
    fn test_missing_expiry_is_expired() {
        let credential = credential_expiring_at(None);
        assert!(credential.is_expired_at(0));
    }
}
