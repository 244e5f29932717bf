//! Integration tests for the orgdesk command line

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Test Helpers
// =============================================================================

/// Temporary directory holding a config file
struct TestEnv {
    _temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn with_config(contents: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, contents).unwrap();
        Self {
            _temp_dir: temp_dir,
            config_path,
        }
    }

    /// Config pointing at a port nothing listens on
    fn unreachable() -> Self {
        Self::with_config(
            r#"
[remote]
url = "http://127.0.0.1:9/users"
timeout_secs = 1
"#,
        )
    }

    /// Config pointing at `server`
    fn serving(server: &MockServer) -> Self {
        Self::with_config(&format!(
            "[remote]\nurl = \"{}/users\"\ntimeout_secs = 5\n\n[view]\npage_size = 2\n",
            server.uri()
        ))
    }

    fn cmd(&self) -> Command {
        let mut cmd = orgdesk_cmd();
        cmd.arg("--config").arg(&self.config_path);
        cmd
    }
}

const USERS: &str = r#"[
  {"id": 1, "name": "Leanne Graham", "phone": "1-770", "company": {"name": "Romaguera-Crona"}, "address": {"city": "Gwenborough", "street": "Kulas Light", "suite": "Apt. 556"}},
  {"id": 2, "name": "Ervin Howell", "phone": "010-692", "company": {"name": "Deckow-Crist"}, "address": {"city": "Wisokyburgh", "street": "Victor Plains", "suite": "Suite 879"}},
  {"id": 3, "name": "Clementine Bauch", "phone": "1-463", "company": {"name": "Romaguera-Jacobson"}, "address": {"city": "McKenziehaven", "street": "Douglas Extension", "suite": "Suite 847"}}
]"#;

async fn users_server() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(USERS, "application/json"))
        .mount(&server)
        .await;
    server
}

fn orgdesk_cmd() -> Command {
    Command::cargo_bin("orgdesk").unwrap()
}

// =============================================================================
// Argument handling
// =============================================================================

#[test]
fn help_lists_subcommands() {
    orgdesk_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn unknown_sort_field_is_rejected() {
    let env = TestEnv::unreachable();
    env.cmd()
        .args(["list", "--sort", "zip"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown sort field"));
}

#[test]
fn desc_requires_sort() {
    let env = TestEnv::unreachable();
    env.cmd().args(["list", "--desc"]).assert().failure();
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn missing_explicit_config_fails() {
    let temp_dir = TempDir::new().unwrap();
    let missing = temp_dir.path().join("nope.toml");

    orgdesk_cmd()
        .arg("--config")
        .arg(&missing)
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.toml"));
}

#[test]
fn malformed_config_fails() {
    let env = TestEnv::with_config("[remote\nurl = ");
    env.cmd().arg("list").assert().failure();
}

#[test]
fn zero_page_size_is_rejected() {
    let env = TestEnv::with_config("[view]\npage_size = 0\n");
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("page_size"));
}

#[test]
fn non_http_url_is_rejected() {
    let env = TestEnv::with_config("[remote]\nurl = \"ftp://example.com/users\"\n");
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("http"));
}

// =============================================================================
// Remote failures
// =============================================================================

#[test]
fn list_fails_when_service_is_unreachable() {
    let env = TestEnv::unreachable();
    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to load records"));
}

#[test]
fn delete_fails_when_service_is_unreachable() {
    let env = TestEnv::unreachable();
    env.cmd()
        .args(["delete", "3"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to delete record #3"));
}

// =============================================================================
// Listing against a live service
// =============================================================================

#[tokio::test]
async fn list_prints_the_requested_page() {
    let server = users_server().await;
    let env = TestEnv::serving(&server);

    env.cmd()
        .args(["list", "--sort", "director", "--desc", "--page", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Clementine Bauch"))
        .stdout(predicate::str::contains("Leanne Graham").not())
        .stdout(predicate::str::contains("page 2 of 2 (3 records)"));
}

#[tokio::test]
async fn list_search_filters_by_director() {
    let server = users_server().await;
    let env = TestEnv::serving(&server);

    env.cmd()
        .args(["list", "--search", "ERV"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deckow-Crist"))
        .stdout(predicate::str::contains("page 1 of 1 (1 records)"));
}

#[tokio::test]
async fn page_past_an_empty_result_is_rejected() {
    let server = users_server().await;
    let env = TestEnv::serving(&server);

    env.cmd()
        .args(["list", "--search", "nomatch", "--page", "5"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("page 5 is out of range (1-1)"));

    env.cmd()
        .args(["list", "--search", "nomatch"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No matching records"))
        .stdout(predicate::str::contains("page 1 of 1 (0 records)"));
}

#[tokio::test]
async fn delete_reports_the_removed_record() {
    let server = users_server().await;
    Mock::given(method("DELETE"))
        .and(path("/users/2"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;
    let env = TestEnv::serving(&server);

    env.cmd()
        .args(["delete", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted record #2"));
}
