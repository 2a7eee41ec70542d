//! Subscription command handlers.

use std::sync::Arc;

use anyhow::{Context, Result};
use subtext_core::session::SessionManager;

pub async fn status(manager: &Arc<SessionManager>) -> Result<()> {
    let status = manager.subscription_status().await.map_err(super::explain)?;

    if status.has_subscription {
        let tier = status
            .subscription
            .and_then(|s| s.tier)
            .unwrap_or_else(|| "active".to_string());
        println!("Subscription: {tier}");
    } else {
        println!("Subscription: none");
        println!("Run `subtext subscription plans` to see available plans.");
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
    Ok(())
}

pub async fn plans(manager: &Arc<SessionManager>) -> Result<()> {
    let plans = manager
        .subscription_plans()
        .await
        .context("fetch subscription plans")?;
    println!(
        "{}",
        serde_json::to_string_pretty(&plans).context("render subscription plans")?
    );
    Ok(())
}

pub async fn create(manager: &Arc<SessionManager>, id: &str, tier: &str) -> Result<()> {
    let response = manager
        .create_subscription(id, tier)
        .await
        .map_err(super::explain)?;

    if response.success {
        println!("✓ Subscription activated ({tier})");
    } else {
        anyhow::bail!("Subscription was not activated");
    }
    Ok(())
}

pub async fn cancel(manager: &Arc<SessionManager>, reason: Option<&str>) -> Result<()> {
    let response = manager
        .cancel_subscription(reason)
        .await
        .map_err(super::explain)?;

    if response.success {
        println!("✓ Subscription cancelled");
    } else {
        anyhow::bail!("Subscription was not cancelled");
    }
    Ok(())
}
