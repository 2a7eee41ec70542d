use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("subtext")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("analyze"))
        .stdout(predicate::str::contains("subscription"));
}

#[test]
fn test_subscription_help_shows_subcommands() {
    cargo_bin_cmd!("subtext")
        .args(["subscription", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("plans"))
        .stdout(predicate::str::contains("create"))
        .stdout(predicate::str::contains("cancel"));
}

#[test]
fn test_analyze_requires_a_message() {
    cargo_bin_cmd!("subtext")
        .arg("analyze")
        .assert()
        .failure();
}
