//! CLI command handlers.

pub mod analyze;
pub mod auth;
pub mod config;
pub mod subscription;

use subtext_core::session::{SessionError, SessionErrorKind};

/// Turns a session error into an actionable message for the terminal.
pub fn explain(err: SessionError) -> anyhow::Error {
    match err.kind {
        SessionErrorKind::ActionDenied => anyhow::anyhow!(
            "{err}. Run `subtext subscription plans` to see upgrade options."
        ),
        SessionErrorKind::SessionExpiredTerminal => {
            anyhow::anyhow!("{err}. Log in again with `subtext login`.")
        }
        SessionErrorKind::SessionExpiredTransient => {
            anyhow::anyhow!("{err}. Your session is intact; try again in a moment.")
        }
        _ => err.into(),
    }
}
