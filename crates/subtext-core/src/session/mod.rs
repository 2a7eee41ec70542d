//! Session and entitlement state management.
//!
//! One [`SessionManager`] instance owns the whole client-side auth lifecycle:
//! durable credential storage, expiry-aware refresh with single-flight
//! de-duplication, and the entitlement gate every protected action passes
//! through.

mod entitlement;
mod error;
mod manager;
mod store;
mod token;

pub use entitlement::{Decision, EntitlementGate};
pub use error::{SessionError, SessionErrorKind, SessionResult};
pub use manager::{AuthPhase, AuthState, SessionManager};
pub use store::{SessionStore, UserProfile};
pub use token::{Credential, CredentialState, EXPIRY_BUFFER_SECS, TokenLifecycle};
