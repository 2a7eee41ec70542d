//! Analysis command handlers (text and screenshot input).

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use subtext_core::api::types::AnalysisResponse;
use subtext_core::session::SessionManager;

pub async fn run(manager: &Arc<SessionManager>, messages: &[String]) -> Result<()> {
    first_run_hint(manager);

    let analysis = manager.analyze(messages).await.map_err(super::explain)?;
    print_analysis(&analysis);
    Ok(())
}

pub async fn ocr(manager: &Arc<SessionManager>, image: &Path, analyze: bool) -> Result<()> {
    first_run_hint(manager);

    let bytes = std::fs::read(image)
        .with_context(|| format!("read image {}", image.display()))?;
    let file_name = image
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("screenshot.png");

    let response = manager
        .ocr(file_name, mime_type(image), bytes)
        .await
        .map_err(super::explain)?;

    let Some(text) = response.extracted_text() else {
        println!("No text found in the image.");
        return Ok(());
    };

    if !analyze {
        println!("{text}");
        return Ok(());
    }

    // Each non-empty line reads as one message, oldest first.
    let messages: Vec<String> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(ToString::to_string)
        .collect();
    if messages.is_empty() {
        println!("No text found in the image.");
        return Ok(());
    }

    let analysis = manager.analyze(&messages).await.map_err(super::explain)?;
    print_analysis(&analysis);
    Ok(())
}

fn print_analysis(analysis: &AnalysisResponse) {
    if let Some(behavior) = &analysis.behavior_type {
        println!("Behavior: {behavior}");
    }
    println!("Hidden intent: {}", analysis.hidden_intent);
    println!("Suggested reply: {}", analysis.strategic_reply);
}

fn mime_type(image: &Path) -> &'static str {
    match image
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        _ => "application/octet-stream",
    }
}

/// One-time pointer for fresh installs, shown before the first analysis.
fn first_run_hint(manager: &Arc<SessionManager>) {
    let store = manager.store();
    if !store.has_seen_onboarding() {
        println!("Welcome to Subtext: paste a conversation and see what's really being said.");
        println!();
        store.mark_onboarding_seen();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Test: common screenshot extensions map to their MIME types.
    #[test]
    fn test_mime_type_from_extension() {
        assert_eq!(mime_type(Path::new("a.PNG")), "image/png");
        assert_eq!(mime_type(Path::new("a.jpeg")), "image/jpeg");
        assert_eq!(mime_type(Path::new("a.webp")), "image/webp");
        assert_eq!(mime_type(Path::new("a")), "application/octet-stream");
    }
}
