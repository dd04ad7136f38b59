//! End-to-end CLI tests for the harvester binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

mod support;
use support::socket_guard::start_mock_server_or_skip;

/// Binary with config lookups pointed at an empty directory.
fn harvester(config_home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("harvester").unwrap();
    cmd.env("XDG_CONFIG_HOME", config_home.path())
        .env_remove("RUST_LOG");
    cmd
}

/// Test that the binary can be invoked without input and exits with code 0.
#[test]
fn test_binary_invocation_returns_zero() {
    let home = TempDir::new().unwrap();
    harvester(&home).write_stdin("").assert().success();
}

/// Test that --help displays usage information and exits with code 0.
#[test]
fn test_binary_help_displays_usage() {
    let home = TempDir::new().unwrap();
    harvester(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Scrape file links from web pages"));
}

/// Test that --version displays version and exits with code 0.
#[test]
fn test_binary_version_displays_version() {
    let home = TempDir::new().unwrap();
    harvester(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("harvester"));
}

/// Test that invalid flags cause non-zero exit.
#[test]
fn test_binary_invalid_flag_returns_error() {
    let home = TempDir::new().unwrap();
    harvester(&home)
        .arg("--invalid-flag")
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_binary_invalid_config_fails_fast() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("broken.toml");
    std::fs::write(&config, "collision = \"rename\"\n").unwrap();
    harvester(&home)
        .arg("--config")
        .arg(&config)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
}

#[test]
fn test_binary_config_verbosity_enables_debug_log() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("harvester.toml");
    std::fs::write(&config, "verbosity = \"verbose\"\n").unwrap();
    harvester(&home)
        .arg("--config")
        .arg(&config)
        .write_stdin("")
        .assert()
        .success()
        .stderr(predicate::str::contains("CLI arguments parsed"))
        .stderr(predicate::str::contains("config_verbosity"))
        .stderr(predicate::str::contains("\"verbose\""));
}

#[test]
fn test_binary_skips_invalid_urls() {
    let home = TempDir::new().unwrap();
    harvester(&home)
        .arg("ftp://example.com/file.txt")
        .assert()
        .success()
        .stderr(predicate::str::contains("Skipped invalid page URL"));
}

#[test]
fn test_binary_missing_required_credentials_file_fails() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    harvester(&home)
        .args(["--no-prompt", "-o"])
        .arg(out.path())
        .arg("--credentials-file")
        .arg(home.path().join("absent.txt"))
        .arg("https://example.com/page.html")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Cannot open credential file"));
}

#[test]
fn test_binary_verbose_log_never_prints_password() {
    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    harvester(&home)
        .args(["-v", "--no-prompt", "-u", "alice", "-p", "hunter2", "-o"])
        .arg(out.path())
        .arg("http://127.0.0.1:9/x.html")
        .assert()
        .success()
        .stderr(predicate::str::contains("CLI arguments parsed"))
        .stderr(predicate::str::contains("hunter2").not());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_downloads_files_and_prints_json_summary() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/gallery/index.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="one.jpg">1</a><a href="two.png">2</a><a href="notes.txt">n</a>"#,
        ))
        .mount(&server)
        .await;
    for file in ["/gallery/one.jpg", "/gallery/two.png"] {
        Mock::given(method("GET"))
            .and(path(file))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"img".to_vec()))
            .mount(&server)
            .await;
    }

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let page = format!("{}/gallery/index.html", server.uri());
    let mut cmd = harvester(&home);
    cmd.args(["--json", "--no-prompt", "-e", "jpg,png", "-o"])
        .arg(out.path())
        .arg(&page);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{output:?}");

    let summary: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(summary["pages_processed"], 1);
    assert_eq!(summary["files_found"], 2);
    assert_eq!(summary["files_downloaded"], 2);
    assert!(out.path().join("one.jpg").exists());
    assert!(out.path().join("two.png").exists());
    assert!(!out.path().join("notes.txt").exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_analyze_only_prints_counts_without_downloading() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("GET"))
        .and(path("/thread.html"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="a.mp4"></a><a href="b.mp4"></a><a href="c.mp4"></a><img src="x.jpg"><img src="y.jpg">"#,
        ))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let page = format!("{}/thread.html", server.uri());
    let mut cmd = harvester(&home);
    cmd.args(["--analyze-only", "-o"]).arg(out.path()).arg(&page);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(".mp4: 3"), "{stdout}");
    assert!(stdout.contains(".jpg: 2"), "{stdout}");
    assert!(stdout.contains("total: 5"), "{stdout}");
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_binary_analyze_only_honors_login_and_extensions() {
    let Some(server) = start_mock_server_or_skip().await else {
        return;
    };
    Mock::given(method("POST"))
        .and(path("/login.php"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "bb_sessionhash=abc; Path=/")
                .set_body_string("Thank you for logging in"),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/thread.html"))
        .and(header("cookie", "bb_sessionhash=abc"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="a.mp4"></a><a href="b.mp4"></a><img src="x.jpg">"#,
        ))
        .mount(&server)
        .await;

    let home = TempDir::new().unwrap();
    let out = TempDir::new().unwrap();
    let page = format!("{}/thread.html", server.uri());
    let mut cmd = harvester(&home);
    cmd.args([
        "--analyze-only",
        "--no-prompt",
        "-u",
        "alice",
        "-p",
        "pw",
        "-e",
        "mp4",
        "-o",
    ])
    .arg(out.path())
    .arg(&page);

    let output = tokio::task::spawn_blocking(move || cmd.output().unwrap())
        .await
        .unwrap();
    assert!(output.status.success(), "{output:?}");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains(".mp4: 2"), "{stdout}");
    assert!(!stdout.contains(".jpg"), "{stdout}");
    assert!(stdout.contains("total: 2"), "{stdout}");
    assert_eq!(std::fs::read_dir(out.path()).unwrap().count(), 0);
}
