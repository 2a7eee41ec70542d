//! Session controller: the one place auth state changes.
//!
//! Every login, logout, refresh outcome, and entitlement answer flows
//! through [`SessionManager`], which keeps the store, the token lifecycle,
//! and the entitlement gate consistent with each other.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use super::entitlement::{Decision, EntitlementGate};
use super::error::{SessionError, SessionErrorKind, SessionResult};
use super::store::{SessionStore, UserProfile};
use super::token::{Credential, CredentialState, TokenLifecycle};
use crate::api::types::{
    AnalysisResponse, AuthResponse, MutationResponse, OcrResponse, SubscriptionStatusResponse,
};
use crate::api::{ApiClient, ApiError};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    Unauthenticated,
    /// A signup or login round-trip is in flight.
    Authenticating,
    Authenticated,
}

impl fmt::Display for AuthPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthPhase::Unauthenticated => write!(f, "unauthenticated"),
            AuthPhase::Authenticating => write!(f, "authenticating"),
            AuthPhase::Authenticated => write!(f, "authenticated"),
        }
    }
}

/// Point-in-time snapshot for display.
#[derive(Debug, Clone)]
pub struct AuthState {
    pub phase: AuthPhase,
    pub user: Option<UserProfile>,
    pub entitled: bool,
}

#[derive(Debug)]
struct Inner {
    phase: AuthPhase,
    user: Option<UserProfile>,
}

pub struct SessionManager {
    api: ApiClient,
    store: Arc<SessionStore>,
    tokens: TokenLifecycle,
    gate: EntitlementGate,
    inner: Mutex<Inner>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: SessionStore) -> Self {
        let store = Arc::new(store);
        Self {
            tokens: TokenLifecycle::new(Arc::clone(&store), api.clone()),
            gate: EntitlementGate::new(Arc::clone(&store)),
            api,
            store,
            inner: Mutex::new(Inner {
                phase: AuthPhase::Unauthenticated,
                user: None,
            }),
        }
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn state(&self) -> AuthState {
        let inner = self.lock_inner();
        AuthState {
            phase: inner.phase,
            user: inner.user.clone(),
            entitled: self.gate.is_active(),
        }
    }

    /// Answer for protected actions, from the cached entitlement only.
    pub fn authorize(&self) -> Decision {
        self.gate.authorize()
    }

    fn lock_inner(&self) -> std::sync::MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_state(&self, phase: AuthPhase, user: Option<UserProfile>) {
        let mut inner = self.lock_inner();
        inner.phase = phase;
        inner.user = user;
    }

    /// Restores the session from disk.
    ///
    /// Seeds auth state and the entitlement cache synchronously, then
    /// reconciles entitlement with the backend in the background so startup
    /// never waits on the network.
    pub fn bootstrap(self: &Arc<Self>) {
        let Some(_credential) = self.store.load_credential() else {
            return;
        };
        let profile = self.store.load_profile();
        self.set_state(AuthPhase::Authenticated, profile);

        let manager = Arc::clone(self);
        let epoch = manager.tokens.epoch();
        tokio::spawn(async move {
            manager.reconcile_entitlement(epoch).await;
        });
    }

    /// Runs the entitlement reconciliation inline and waits for it.
    ///
    /// Login and bootstrap spawn the same work so interactive callers are
    /// never blocked on it; a short-lived process that is about to exit must
    /// await this instead, or the spawned task dies with the runtime and the
    /// cache is never populated.
    pub async fn sync_entitlement(&self) {
        let epoch = self.tokens.epoch();
        self.reconcile_entitlement(epoch).await;
    }

    /// Fetches entitlement and overwrites the cache on success. Failures are
    /// logged and the last known answer stays in place. Results from a
    /// session that has since been replaced are discarded.
    async fn reconcile_entitlement(&self, started_epoch: u64) {
        let credential = match self.tokens.ensure_fresh().await {
            Ok(CredentialState::Fresh(credential)) => credential,
            Ok(CredentialState::Unauthenticated) => return,
            Err(err) if err.kind == SessionErrorKind::SessionExpiredTerminal => {
                self.teardown();
                return;
            }
            Err(err) => {
                tracing::warn!("skipping entitlement check: {err}");
                return;
            }
        };
        match self.api.subscription_status(&credential.access_token).await {
            Ok(status) => {
                if self.tokens.epoch() == started_epoch {
                    self.gate.apply_status(&status);
                }
            }
            Err(err) => {
                tracing::warn!("entitlement check failed, keeping last known answer: {err}");
            }
        }
    }

    pub async fn login(self: &Arc<Self>, email: &str, password: &str) -> SessionResult<UserProfile> {
        self.set_state(AuthPhase::Authenticating, None);
        let response = match self.api.login(email, password).await {
            Ok(response) => response,
            Err(err) => {
                self.set_state(AuthPhase::Unauthenticated, None);
                return Err(SessionError::from_auth_failure(err));
            }
        };
        let profile = self.adopt_session(response, "Login succeeded but no session was returned")?;

        // The previous cached entitlement answers until this completes.
        let manager = Arc::clone(self);
        let epoch = manager.tokens.epoch();
        tokio::spawn(async move {
            manager.reconcile_entitlement(epoch).await;
        });

        Ok(profile)
    }

    pub async fn signup(
        self: &Arc<Self>,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> SessionResult<UserProfile> {
        self.set_state(AuthPhase::Authenticating, None);
        let response = match self.api.signup(email, password, full_name).await {
            Ok(response) => response,
            Err(err) => {
                self.set_state(AuthPhase::Unauthenticated, None);
                return Err(SessionError::from_auth_failure(err));
            }
        };
        let profile = self.adopt_session(
            response,
            "Account created but no session was returned. Confirm your email, then log in.",
        )?;
        // Fresh accounts start without a subscription.
        self.gate.record_change(false);
        Ok(profile)
    }

    /// Installs a new session from an auth response: persists credential and
    /// profile together and bumps the epoch so any refresh still in flight
    /// for the old session is discarded.
    fn adopt_session(
        &self,
        response: AuthResponse,
        missing_session_message: &str,
    ) -> SessionResult<UserProfile> {
        let (Some(session), Some(user)) = (response.session, response.user) else {
            self.set_state(AuthPhase::Unauthenticated, None);
            return Err(SessionError::auth_invalid(missing_session_message));
        };

        self.tokens.bump_epoch();
        self.store.save_credential(&Credential {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
        });
        let profile = UserProfile {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
        };
        self.store.save_profile(&profile);
        self.set_state(AuthPhase::Authenticated, Some(profile.clone()));
        tracing::info!(email = %profile.email, "logged in");
        Ok(profile)
    }

    /// Logs out. Backend invalidation is best effort; local state is always
    /// cleared.
    pub async fn logout(&self) {
        if let Some(credential) = self.store.load_credential()
            && let Err(err) = self.api.logout(&credential.access_token).await
        {
            tracing::debug!("backend logout failed: {err}");
        }
        self.teardown();
        tracing::info!("logged out");
    }

    /// Drops the session everywhere at once: epoch, store, gate, auth state.
    fn teardown(&self) {
        self.tokens.bump_epoch();
        self.store.clear_session();
        self.gate.reset();
        self.set_state(AuthPhase::Unauthenticated, None);
    }

    /// Returns a fresh access token for a protected call, tearing the
    /// session down first when refresh says it is gone for good.
    async fn access_token(&self) -> SessionResult<String> {
        match self.tokens.ensure_fresh().await {
            Ok(CredentialState::Fresh(credential)) => Ok(credential.access_token),
            Ok(CredentialState::Unauthenticated) => Err(SessionError::unauthenticated()),
            Err(err) => {
                if err.kind == SessionErrorKind::SessionExpiredTerminal {
                    self.teardown();
                }
                Err(err)
            }
        }
    }

    /// Cheap local check so a logged-out user gets a login prompt instead of
    /// an upgrade prompt.
    fn require_auth_locally(&self) -> SessionResult<()> {
        if self.store.load_credential().is_none() {
            return Err(SessionError::unauthenticated());
        }
        Ok(())
    }

    fn require_entitlement(&self) -> SessionResult<()> {
        match self.gate.authorize() {
            Decision::Permit => Ok(()),
            Decision::UpgradeRequired => Err(SessionError::action_denied(
                "This action requires an active subscription",
            )),
        }
    }

    /// Analyzes a conversation. Requires auth and an active entitlement.
    pub async fn analyze(&self, messages: &[String]) -> SessionResult<AnalysisResponse> {
        self.require_auth_locally()?;
        self.require_entitlement()?;
        let token = self.access_token().await?;
        self.api
            .analyze(&token, messages)
            .await
            .map_err(SessionError::backend)
    }

    /// Extracts text from a screenshot. Requires auth and an active
    /// entitlement.
    pub async fn ocr(
        &self,
        file_name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> SessionResult<OcrResponse> {
        self.require_auth_locally()?;
        self.require_entitlement()?;
        let token = self.access_token().await?;
        self.api
            .ocr(&token, file_name, mime_type, bytes)
            .await
            .map_err(SessionError::backend)
    }

    /// Fetches subscription status and overwrites the entitlement cache on
    /// success.
    pub async fn subscription_status(&self) -> SessionResult<SubscriptionStatusResponse> {
        let token = self.access_token().await?;
        let status = self
            .api
            .subscription_status(&token)
            .await
            .map_err(SessionError::backend)?;
        self.gate.apply_status(&status);
        Ok(status)
    }

    pub async fn subscription_plans(&self) -> Result<serde_json::Value, ApiError> {
        self.api.subscription_plans().await
    }

    /// Activates a subscription and grants the entitlement locally on
    /// success, without waiting for the next status fetch.
    pub async fn create_subscription(
        &self,
        subscription_id: &str,
        tier: &str,
    ) -> SessionResult<MutationResponse> {
        let token = self.access_token().await?;
        let response = self
            .api
            .create_subscription(&token, subscription_id, tier)
            .await
            .map_err(SessionError::backend)?;
        if response.success {
            self.gate.record_change(true);
        }
        Ok(response)
    }

    /// Cancels the subscription and revokes the entitlement locally on
    /// success.
    pub async fn cancel_subscription(
        &self,
        reason: Option<&str>,
    ) -> SessionResult<MutationResponse> {
        let token = self.access_token().await?;
        let response = self
            .api
            .cancel_subscription(&token, reason)
            .await
            .map_err(SessionError::backend)?;
        if response.success {
            self.gate.record_change(false);
        }
        Ok(response)
    }
}
