//! Auth command handlers.

use std::sync::Arc;

use anyhow::Result;
use subtext_core::session::{AuthPhase, SessionManager};

pub async fn signup(
    manager: &Arc<SessionManager>,
    email: &str,
    password: &str,
    name: &str,
) -> Result<()> {
    let user = manager
        .signup(email, password, name)
        .await
        .map_err(super::explain)?;

    println!("✓ Account created for {}", user.email);
    println!("  Session saved to: {}", manager.store().path().display());
    Ok(())
}

pub async fn login(manager: &Arc<SessionManager>, email: &str, password: &str) -> Result<()> {
    let user = manager.login(email, password).await.map_err(super::explain)?;

    println!("✓ Logged in as {}", user.email);
    println!("  Session saved to: {}", manager.store().path().display());

    // One-shot process: wait for the entitlement cache to land before exit,
    // or the next protected command would answer from an empty cache.
    manager.sync_entitlement().await;
    Ok(())
}

pub async fn logout(manager: &Arc<SessionManager>) -> Result<()> {
    if manager.store().load_credential().is_none() {
        println!("Not logged in (no session found).");
        return Ok(());
    }

    manager.logout().await;
    println!("✓ Logged out");
    println!("  Session removed from: {}", manager.store().path().display());
    Ok(())
}

pub async fn status(manager: &Arc<SessionManager>) -> Result<()> {
    let state = manager.state();
    if state.phase != AuthPhase::Authenticated {
        println!("Not logged in. Run `subtext login` to get started.");
        return Ok(());
    }

    match &state.user {
        Some(user) if !user.full_name.is_empty() => {
            println!("Logged in as {} ({})", user.full_name, user.email);
        }
        Some(user) => println!("Logged in as {}", user.email),
        None => println!("Logged in"),
    }

    match manager.subscription_status().await {
        Ok(status) => {
            if status.has_subscription {
                let tier = status
                    .subscription
                    .and_then(|s| s.tier)
                    .unwrap_or_else(|| "active".to_string());
                println!("Subscription: {tier}");
            } else {
                println!("Subscription: none");
            }
            if let Some(usage) = status.usage {
                if usage.limit < 0 {
                    println!("Usage this month: {} (unlimited)", usage.current);
                } else {
                    println!(
                        "Usage this month: {} of {} ({} remaining)",
                        usage.current, usage.limit, usage.remaining
                    );
                }
            }
        }
        Err(err) => {
            // The session view above is still accurate; the subscription
            // line just reflects the last known answer.
            tracing::warn!("subscription status unavailable: {err}");
            println!(
                "Subscription: {} (backend unreachable, showing last known)",
                if state.entitled { "active" } else { "none" }
            );
        }
    }
    Ok(())
}
