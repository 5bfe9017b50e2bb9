//! CLI integration tests
use httpmock::prelude::*;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd() -> assert_cmd::Command {
    assert_cmd::cargo::cargo_bin_cmd!("urltitle")
}

/// A command isolated from the user's override directory.
fn isolated_cmd(config_dir: &TempDir) -> assert_cmd::Command {
    let mut cmd = cmd();
    cmd.args(["--config-dir", config_dir.path().to_str().unwrap(), "--webcache-prefix", ""]);
    cmd
}

fn serve_title(server: &MockServer, path: &str, title: &str) {
    let body = format!("<html><head><title>{}</title></head><body><p>content</p></body></html>", title);
    server.mock(|when, then| {
        when.method(GET).path(path);
        then.status(200).header("content-type", "text/html; charset=utf-8").body(body);
    });
}

#[test]
fn test_cli_netloc() {
    cmd()
        .args(["--netloc", "https://www.Example.com/x", "example.com/y", "HTTP://EXAMPLE.COM"])
        .assert()
        .success()
        .stdout("example.com\nexample.com\nexample.com\n");
}

#[test]
fn test_cli_netloc_json() {
    cmd()
        .args(["--netloc", "--json", "www.reuters.com/article/abc"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"netloc\":\"reuters.com\""));
}

#[test]
fn test_cli_title() {
    let server = MockServer::start();
    serve_title(&server, "/page", "Hello   World");
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .arg(server.url("/page"))
        .assert()
        .success()
        .stdout("Hello World\n");
}

#[test]
fn test_cli_multiple_urls_keep_order() {
    let server = MockServer::start();
    serve_title(&server, "/one", "First");
    serve_title(&server, "/two", "Second");
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args([server.url("/one"), server.url("/two")])
        .assert()
        .success()
        .stdout("First\nSecond\n");
}

#[test]
fn test_cli_json() {
    let server = MockServer::start();
    serve_title(&server, "/page", "Json Page");
    let tmp = TempDir::new().unwrap();

    let output = isolated_cmd(&tmp).args(["--json", &server.url("/page")]).output().unwrap();
    assert!(output.status.success());

    let record: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(record["title"], "Json Page");
    assert_eq!(record["netloc"], format!("127.0.0.1:{}", server.port()));
    assert!(record.get("error").is_none());
}

#[test]
fn test_cli_failure_exit_code() {
    let server = MockServer::start();
    serve_title(&server, "/ok", "Still Printed");
    server.mock(|when, then| {
        when.method(GET).path("/missing");
        then.status(404);
    });
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args([server.url("/missing"), server.url("/ok")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("Still Printed"))
        .stderr(predicate::str::contains("404"));
}

#[test]
fn test_cli_json_error_kind() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/down");
        then.status(503);
    });
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args(["--json", "--attempts", "2", &server.url("/down")])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"kind\":\"retry_exhausted\""));
}

#[test]
fn test_cli_config_dir_override() {
    let server = MockServer::start();
    serve_title(&server, "/story", "Big Story - Example Times");
    let tmp = TempDir::new().unwrap();
    std::fs::write(
        tmp.path().join(format!("127.0.0.1:{}.txt", server.port())),
        "# strip the site name\ntitle_pattern: \\s+-\\s+Example Times$\ntitle_replacement: \n",
    )
    .unwrap();

    isolated_cmd(&tmp)
        .arg(server.url("/story"))
        .assert()
        .success()
        .stdout("Big Story\n");
}

#[test]
fn test_cli_invalid_config_dir_file() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("example.com.txt"), "no_such_directive: 1\n").unwrap();

    isolated_cmd(&tmp)
        .arg("https://example.com/")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown directive"));
}

#[test]
fn test_cli_user_agent() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(GET).path("/ua").header("user-agent", "tester/2.0");
        then.status(200).header("content-type", "text/html").body("<title>Agent</title><p>x</p>");
    });
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args(["--user-agent", "tester/2.0", &server.url("/ua")])
        .assert()
        .success()
        .stdout("Agent\n");
    mock.assert();
}

#[test]
fn test_cli_verbose() {
    let server = MockServer::start();
    serve_title(&server, "/page", "Verbose");
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args(["-v", &server.url("/page")])
        .assert()
        .success()
        .stderr(predicate::str::contains("urltitle"));
}

#[test]
fn test_cli_zero_attempts_is_setup_error() {
    let tmp = TempDir::new().unwrap();

    isolated_cmd(&tmp)
        .args(["--attempts", "0", "https://example.com/"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("max_attempts"));
}

#[test]
fn test_cli_completions() {
    cmd()
        .args(["--completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("urltitle"));
}

#[test]
fn test_cli_requires_url() {
    cmd().assert().failure();
}
