//! Integration tests for the `edadmin` binary.
//!
//! Argument parsing, help output, completions and error handling run
//! without a backend; the record tests drive the binary against wiremock
//! with a throwaway config directory.
#![allow(clippy::unwrap_used)]

use std::path::Path;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

/// Build a [`Command`] for the `edadmin` binary with env isolation.
///
/// Clears all `EDADMIN_*` env vars and points config directories at
/// `home` so tests never touch the user's real configuration.
fn edadmin_at(home: &Path) -> assert_cmd::Command {
    let mut cmd = cargo_bin_cmd!("edadmin");
    cmd.env("HOME", home)
        .env("XDG_CONFIG_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("EDADMIN_PROFILE")
        .env_remove("EDADMIN_URL")
        .env_remove("EDADMIN_IMPERSONATE")
        .env_remove("EDADMIN_OUTPUT")
        .env_remove("EDADMIN_INSECURE")
        .env_remove("EDADMIN_TIMEOUT")
        .env_remove("EDADMIN_USERNAME")
        .env_remove("EDADMIN_PASSWORD")
        .env_remove("EDADMIN_COOKIE");
    cmd
}

fn edadmin_cmd() -> assert_cmd::Command {
    edadmin_at(Path::new("/tmp/edadmin-cli-test-nonexistent"))
}

/// Concatenate stdout + stderr from a command output for flexible matching.
fn combined_output(output: &std::process::Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{stdout}{stderr}")
}

/// Config dir with a logged-in profile pointing at `url`.
fn logged_in_home(url: &str) -> tempfile::TempDir {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("edadmin");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.toml"),
        format!("default_profile = \"test\"\n\n[profiles.test]\nurl = \"{url}\"\nuid = \"u1\"\n"),
    )
    .unwrap();
    home
}

/// Run the binary off the async runtime so wiremock keeps serving.
async fn run(mut cmd: assert_cmd::Command) -> std::process::Output {
    tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap()
}

// ── Basic invocation ────────────────────────────────────────────────

#[test]
fn test_no_args_shows_help() {
    let output = edadmin_cmd().output().unwrap();
    assert_eq!(output.status.code(), Some(2), "Expected exit code 2");
    let text = combined_output(&output);
    assert!(text.contains("Usage"), "Expected 'Usage' in output:\n{text}");
}

#[test]
fn test_help_flag() {
    edadmin_cmd().arg("--help").assert().success().stdout(
        predicate::str::contains("email delivery platform")
            .and(predicate::str::contains("broadcasts"))
            .and(predicate::str::contains("policies"))
            .and(predicate::str::contains("customers")),
    );
}

#[test]
fn test_version_flag() {
    edadmin_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("edadmin"));
}

// ── Shell completions ───────────────────────────────────────────────

#[test]
fn test_completions_bash() {
    edadmin_cmd()
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty().not());
}

#[test]
fn test_completions_zsh() {
    edadmin_cmd()
        .args(["completions", "zsh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("#compdef"));
}

// ── Offline commands ────────────────────────────────────────────────

#[test]
fn test_config_show_no_config() {
    // Falls back to the default config when no file exists.
    edadmin_cmd().args(["config", "show"]).assert().success();
}

#[test]
fn test_webhook_events_need_no_backend() {
    edadmin_cmd()
        .args(["-o", "plain", "webhooks", "events"])
        .assert()
        .success()
        .stdout(predicate::str::contains("open_click").and(predicate::str::contains("hard_bounce")));
}

// ── Error cases ─────────────────────────────────────────────────────

#[test]
fn test_invalid_subcommand() {
    let output = edadmin_cmd().arg("foobar").output().unwrap();
    assert!(!output.status.success(), "Expected failure for invalid subcommand");
    let text = combined_output(&output);
    assert!(
        text.contains("unrecognized") || text.contains("foobar"),
        "Expected error mentioning invalid subcommand:\n{text}"
    );
}

#[test]
fn test_lists_list_without_config() {
    edadmin_cmd()
        .args(["lists", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config").or(predicate::str::contains("Configuration")));
}

#[test]
fn test_unknown_profile_is_reported() {
    edadmin_cmd()
        .args(["--profile", "nope", "lists", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_invalid_output_format() {
    let output = edadmin_cmd()
        .args(["--output", "invalid", "lists", "list"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_edit_requires_an_id() {
    let output = edadmin_cmd().args(["routes", "edit"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn test_tablestate_conflicts_with_sort() {
    let output = edadmin_cmd()
        .args(["lists", "list", "--tablestate", "{}", "--sort", "-count"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

// ── Against a backend ───────────────────────────────────────────────

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_patches_loaded_record() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lists/42"))
        .and(header("x-auth-uid", "u1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "42", "name": "Old", "count": 7})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/lists/42"))
        .and(body_json(json!({"id": "42", "name": "Foo", "count": 7})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let home = logged_in_home(&server.uri());
    let mut cmd = edadmin_at(home.path());
    cmd.env("EDADMIN_COOKIE", "c00kie")
        .args(["lists", "edit", "42", "--set", "name=Foo"]);
    let output = run(cmd).await;

    let text = combined_output(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("Saved contact list 42"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_edit_dry_run_prints_without_saving() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lists/42"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"id": "42", "name": "Old", "count": 7})),
        )
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(0)
        .mount(&server)
        .await;

    let home = logged_in_home(&server.uri());
    let mut cmd = edadmin_at(home.path());
    cmd.env("EDADMIN_COOKIE", "c00kie")
        .args(["lists", "edit", "42", "--set", "name=Foo", "--dry-run"]);
    let output = run(cmd).await;

    let text = combined_output(&output);
    assert!(output.status.success(), "{text}");
    assert!(text.contains("Foo"), "{text}");
    assert!(!text.contains("Saved"), "{text}");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_new_webhook_prints_edit_location() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/resthooks"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"id": "abc123"})))
        .expect(1)
        .mount(&server)
        .await;

    let home = logged_in_home(&server.uri());
    let mut cmd = edadmin_at(home.path());
    cmd.env("EDADMIN_COOKIE", "c00kie").args([
        "webhooks",
        "new",
        "--set",
        "name=Hook",
        "--set",
        "target_url=https://example.com/h",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout).trim(),
        "/webhooks/edit?id=abc123"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_list_search_and_sort_locally() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/segments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "s1", "name": "VIP buyers", "count": 10},
            {"id": "s2", "name": "Lapsed", "count": 99},
            {"id": "s3", "name": "vip trial", "count": 50},
        ])))
        .mount(&server)
        .await;

    let home = logged_in_home(&server.uri());
    let mut cmd = edadmin_at(home.path());
    cmd.env("EDADMIN_COOKIE", "c00kie").args([
        "-o", "plain", "segments", "list", "--search", "vip", "--sort", "-count",
    ]);
    let output = run(cmd).await;

    assert!(output.status.success(), "{}", combined_output(&output));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "s3\ns1");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_missing_record_exits_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/lists/nope"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "title": "404 Not Found",
            "description": "no such list",
        })))
        .mount(&server)
        .await;

    let home = logged_in_home(&server.uri());
    let mut cmd = edadmin_at(home.path());
    cmd.env("EDADMIN_COOKIE", "c00kie")
        .args(["lists", "show", "nope"]);
    let output = run(cmd).await;

    assert_eq!(output.status.code(), Some(4), "{}", combined_output(&output));
}
