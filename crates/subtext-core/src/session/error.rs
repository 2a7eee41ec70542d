//! Error taxonomy for session and entitlement operations.

use std::fmt;

use crate::api::ApiError;

/// Categories of session errors for consistent handling in callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionErrorKind {
    /// Signup or login rejected by the backend (bad credentials, invalid input).
    AuthInvalid,
    /// No usable credential; the caller must log in first.
    Unauthenticated,
    /// Refresh rejected with a 4xx. The stored credential has been destroyed
    /// and the user must log in again.
    SessionExpiredTerminal,
    /// Refresh failed for a transient reason (network, 5xx). The stored
    /// credential is intact; the operation can be retried.
    SessionExpiredTransient,
    /// A protected action was denied locally by the entitlement gate.
    ActionDenied,
    /// The backend rejected or failed an otherwise well-formed request.
    Backend,
}

impl fmt::Display for SessionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionErrorKind::AuthInvalid => write!(f, "auth_invalid"),
            SessionErrorKind::Unauthenticated => write!(f, "unauthenticated"),
            SessionErrorKind::SessionExpiredTerminal => write!(f, "session_expired_terminal"),
            SessionErrorKind::SessionExpiredTransient => write!(f, "session_expired_transient"),
            SessionErrorKind::ActionDenied => write!(f, "action_denied"),
            SessionErrorKind::Backend => write!(f, "backend"),
        }
    }
}

/// Structured session error with kind and an optional backend detail.
#[derive(Debug, Clone)]
pub struct SessionError {
    /// Error category
    pub kind: SessionErrorKind,
    /// One-line summary suitable for display
    pub message: String,
    /// Optional additional details (e.g., backend error body)
    pub details: Option<String>,
}

impl SessionError {
    pub fn new(kind: SessionErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            details: None,
        }
    }

    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::AuthInvalid, message)
    }

    pub fn unauthenticated() -> Self {
        Self::new(
            SessionErrorKind::Unauthenticated,
            "Not logged in. Run `subtext login` first.",
        )
    }

    pub fn expired_terminal(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::SessionExpiredTerminal, message)
    }

    pub fn expired_transient(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::SessionExpiredTransient, message)
    }

    pub fn action_denied(message: impl Into<String>) -> Self {
        Self::new(SessionErrorKind::ActionDenied, message)
    }

    /// Wraps a backend error, keeping its raw body as detail.
    pub fn backend(err: ApiError) -> Self {
        Self {
            kind: SessionErrorKind::Backend,
            message: err.message,
            details: err.details,
        }
    }

    /// Maps an auth-route failure: 4xx means the credentials were rejected,
    /// anything else is a backend/transport problem.
    pub fn from_auth_failure(err: ApiError) -> Self {
        if err.is_client_error() {
            Self {
                kind: SessionErrorKind::AuthInvalid,
                message: err.message,
                details: err.details,
            }
        } else {
            Self::backend(err)
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for SessionError {}

/// Result type for session operations.
pub type SessionResult<T> = std::result::Result<T, SessionError>;
