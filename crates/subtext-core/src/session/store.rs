//! Durable session state under the Subtext home directory.
//!
//! Everything lives in a single `session.json`: the credential, the user
//! profile, the last known entitlement flag, and the onboarding marker.
//! Storage failures never abort the caller; the store degrades to empty
//! state and logs a warning.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use super::token::Credential;
use crate::config::paths;

/// Authenticated user record kept alongside the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub full_name: String,
}

/// On-disk shape of `session.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    credential: Option<Credential>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    profile: Option<UserProfile>,
    /// Last entitlement answer from the backend, kept across restarts so the
    /// gate has something to serve before the next fetch completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    has_subscription: Option<bool>,
    #[serde(default)]
    has_seen_onboarding: bool,
}

/// File-backed session store.
///
/// Writes are atomic (temp file + rename) so a concurrent reader never sees
/// a truncated file, and read-modify-write cycles are serialized in-process
/// so concurrent tasks cannot drop each other's keys.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    /// Creates a store over an explicit file path (used by tests).
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Creates a store at the default location (`$SUBTEXT_HOME/session.json`).
    pub fn open_default() -> Self {
        Self::new(paths::session_path())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the persisted state, degrading to empty on any failure.
    fn read_state(&self) -> PersistedState {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return PersistedState::default();
            }
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to read session file: {e}");
                return PersistedState::default();
            }
        };
        match serde_json::from_str(&contents) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "malformed session file, ignoring: {e}");
                PersistedState::default()
            }
        }
    }

    /// Writes the state back, best effort, via temp file + rename so a
    /// reader never observes a truncated file. The session file holds a
    /// bearer token, so it is created owner-only on Unix.
    fn write_state(&self, state: &PersistedState) {
        let result = (|| -> anyhow::Result<()> {
            if let Some(parent) = self.path.parent() {
                fs::create_dir_all(parent)?;
            }
            let json = serde_json::to_string_pretty(state)?;

            let tmp_path = self.path.with_extension("json.tmp");
            fs::write(&tmp_path, json)?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
            }

            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })();

        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), "failed to write session file: {e}");
        }
    }

    /// Read-modify-write under the in-process lock, so concurrent tasks
    /// (e.g. a protected action and a background entitlement refresh) cannot
    /// overwrite each other's keys.
    fn update(&self, f: impl FnOnce(&mut PersistedState)) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let mut state = self.read_state();
        f(&mut state);
        self.write_state(&state);
    }

    pub fn load_credential(&self) -> Option<Credential> {
        self.read_state().credential
    }

    pub fn save_credential(&self, credential: &Credential) {
        self.update(|state| state.credential = Some(credential.clone()));
    }

    /// Removes every key this store owns at once (logout, terminal refresh
    /// failure). Tolerates an already-missing file.
    pub fn clear_session(&self) {
        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                tracing::warn!(path = %self.path.display(), "failed to remove session file: {e}");
            }
        }
    }

    pub fn load_profile(&self) -> Option<UserProfile> {
        self.read_state().profile
    }

    pub fn save_profile(&self, profile: &UserProfile) {
        self.update(|state| state.profile = Some(profile.clone()));
    }

    /// Last entitlement answer, or `None` when the backend was never asked.
    pub fn load_entitlement(&self) -> Option<bool> {
        self.read_state().has_subscription
    }

    pub fn save_entitlement(&self, has_subscription: bool) {
        self.update(|state| state.has_subscription = Some(has_subscription));
    }

    pub fn has_seen_onboarding(&self) -> bool {
        self.read_state().has_seen_onboarding
    }

    pub fn mark_onboarding_seen(&self) {
        self.update(|state| state.has_seen_onboarding = true);
    }
}
