//! End-to-end CLI tests for login, logout, status, and analyze against a
//! mock backend.

use std::fs;
use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use chrono::Utc;
use predicates::prelude::*;
use serde_json::json;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a temp SUBTEXT_HOME directory for test isolation.
fn temp_home() -> TempDir {
    TempDir::new().expect("create temp subtext home")
}

fn can_bind_localhost() -> bool {
    std::net::TcpListener::bind("127.0.0.1:0").is_ok()
}

/// Writes a session file with a credential valid for an hour.
fn seed_session(home: &Path, entitled: bool) {
    let state = json!({
        "credential": {
            "access_token": "at-test",
            "refresh_token": "rt-test",
            "expires_at": Utc::now().timestamp() + 3600,
        },
        "profile": {
            "id": "user-1",
            "email": "dana@example.com",
            "full_name": "Dana",
        },
        "has_subscription": entitled,
        "has_seen_onboarding": true,
    });
    fs::write(home.join("session.json"), state.to_string()).unwrap();
}

fn auth_response_body() -> serde_json::Value {
    json!({
        "session": {
            "accessToken": "at-1",
            "refreshToken": "rt-1",
            "expiresAt": Utc::now().timestamp() + 3600,
        },
        "user": {
            "id": "user-1",
            "email": "dana@example.com",
            "fullName": "Dana",
        }
    })
}

#[tokio::test]
async fn test_login_saves_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscription/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasSubscription": false})))
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["login", "--email", "dana@example.com", "--password", "hunter2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Logged in as dana@example.com"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("at-1"));
    assert!(session.contains("dana@example.com"));
}

#[tokio::test]
async fn test_login_then_analyze_for_subscriber() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_response_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscription/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasSubscription": true})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hiddenIntent": "They are avoiding commitment.",
            "strategicReply": "Ask for a concrete time.",
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["login", "--email", "dana@example.com", "--password", "hunter2"])
        .assert()
        .success();

    // The login run must have persisted the entitlement answer, not lost it
    // with the process.
    let session = fs::read_to_string(home.path().join("session.json")).unwrap();
    assert!(session.contains("\"has_subscription\": true"));

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["analyze", "hey, are we still on?"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Hidden intent: They are avoiding commitment."));
}

#[tokio::test]
async fn test_login_rejected_leaves_no_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"error": "Invalid login credentials"})),
        )
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["login", "--email", "dana@example.com", "--password", "wrong"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid login credentials"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap_or_default();
    assert!(!session.contains("access_token"));
}

#[tokio::test]
async fn test_logout_clears_session() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    seed_session(home.path(), true);

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Logged out"));

    let session = fs::read_to_string(home.path().join("session.json")).unwrap_or_default();
    assert!(!session.contains("at-test"));
}

#[test]
fn test_logout_without_session() {
    let home = temp_home();

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[test]
fn test_status_logged_out() {
    let home = temp_home();

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not logged in"));
}

#[tokio::test]
async fn test_status_logged_in_with_subscription() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    seed_session(home.path(), true);

    Mock::given(method("GET"))
        .and(path("/subscription/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "hasSubscription": true,
            "subscription": {"tier": "premium"},
            "usage": {"current": 3, "limit": 10, "remaining": 7},
        })))
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in as Dana (dana@example.com)"))
        .stdout(predicate::str::contains("Subscription: premium"))
        .stdout(predicate::str::contains("Usage this month: 3 of 10 (7 remaining)"));
}

#[tokio::test]
async fn test_analyze_denied_without_subscription() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    seed_session(home.path(), false);

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["analyze", "hey, are we still on?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("requires an active subscription"))
        .stderr(predicate::str::contains("subtext subscription plans"));
}

#[tokio::test]
async fn test_analyze_prints_result() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;
    seed_session(home.path(), true);

    Mock::given(method("POST"))
        .and(path("/analyze"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "behaviorType": "deflection",
            "hiddenIntent": "They are avoiding commitment.",
            "strategicReply": "Ask for a concrete time.",
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subscription/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"hasSubscription": true})))
        .mount(&server)
        .await;

    cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["analyze", "hey, are we still on?", "sure, maybe"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Behavior: deflection"))
        .stdout(predicate::str::contains("Hidden intent: They are avoiding commitment."))
        .stdout(predicate::str::contains("Suggested reply: Ask for a concrete time."));
}

#[tokio::test]
async fn test_first_run_hint_shown_once() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_home();
    let server = MockServer::start().await;

    // Fresh install: no session, no onboarding marker.
    let assert = cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["analyze", "hello"])
        .assert()
        .failure(); // not logged in
    assert.stdout(predicate::str::contains("Welcome to Subtext"));

    let assert = cargo_bin_cmd!("subtext")
        .env("SUBTEXT_HOME", home.path())
        .env("SUBTEXT_API_URL", server.uri())
        .args(["analyze", "hello"])
        .assert()
        .failure();
    assert.stdout(predicate::str::contains("Welcome to Subtext").not());
}
