//! Local entitlement gate for protected actions.
//!
//! The gate never blocks on the network: it answers from the in-memory flag,
//! which is seeded from the store at startup and overwritten whenever a
//! status fetch or subscription mutation succeeds. Fetch failures leave the
//! last known answer in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use super::store::SessionStore;
use crate::api::types::SubscriptionStatusResponse;

/// Answer from the gate for a protected action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Permit,
    /// Denied locally. The caller should surface the upgrade path, not an
    /// error.
    UpgradeRequired,
}

pub struct EntitlementGate {
    store: Arc<SessionStore>,
    active: AtomicBool,
}

impl EntitlementGate {
    /// Creates a gate seeded from the last persisted answer (default: no
    /// subscription).
    pub fn new(store: Arc<SessionStore>) -> Self {
        let active = store.load_entitlement().unwrap_or(false);
        Self {
            store,
            active: AtomicBool::new(active),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Synchronous check against the cached flag.
    pub fn authorize(&self) -> Decision {
        if self.is_active() {
            Decision::Permit
        } else {
            Decision::UpgradeRequired
        }
    }

    /// Records a definitive answer (successful fetch or a local mutation
    /// after purchase/cancel) in memory and on disk.
    pub fn record_change(&self, active: bool) {
        self.active.store(active, Ordering::SeqCst);
        self.store.save_entitlement(active);
    }

    pub fn apply_status(&self, status: &SubscriptionStatusResponse) {
        self.record_change(status.has_subscription);
    }

    /// Drops the in-memory flag without touching the store. Used on logout,
    /// where the store is cleared separately.
    pub fn reset(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}
