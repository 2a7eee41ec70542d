//! File logging for the CLI.
//!
//! Logs go to rolling files under the Subtext home, never to stdout, so
//! command output stays clean for piping. Filtering follows `SUBTEXT_LOG`
//! (default: `info` for this workspace's crates).

use std::fs;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

use subtext_core::config::paths;

const LOG_ENV_VAR: &str = "SUBTEXT_LOG";

/// Initializes the tracing subscriber. Returns a guard that must stay alive
/// for the duration of the process, or `None` when the log directory is not
/// writable (the CLI still works, just without logs).
pub fn init() -> Option<WorkerGuard> {
    let logs_dir = paths::logs_dir();
    if fs::create_dir_all(&logs_dir).is_err() {
        return None;
    }

    let directives = std::env::var(LOG_ENV_VAR).unwrap_or_default();
    let mut filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .parse_lossy(&directives);
    for target in ["subtext", "subtext_core"] {
        // Default our own crates to info unless overridden.
        if !directives.contains(&format!("{target}="))
            && let Ok(directive) = format!("{target}=info").parse()
        {
            filter = filter.add_directive(directive);
        }
    }

    let appender = tracing_appender::rolling::daily(logs_dir, "subtext.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .init();

    Some(guard)
}
