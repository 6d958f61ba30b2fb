use std::io::Write;
use std::net::TcpListener;
use std::path::Path;
use std::time::Duration;

use reqwest::Client;
use tempfile::{NamedTempFile, TempDir};
use tokio::time::{sleep, timeout};

/// Find an available port
fn get_available_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Create a minimal valid config with an empty binary root
fn minimal_config(port: u16, bin_root: &Path) -> String {
    format!(
        r#"
[server]
host = "127.0.0.1"
port = {}

[resolver]
bin_root = "{}"
"#,
        port,
        bin_root.display()
    )
}

fn write_config(content: &str) -> NamedTempFile {
    let mut temp_file = NamedTempFile::new().unwrap();
    temp_file.write_all(content.as_bytes()).unwrap();
    temp_file.flush().unwrap();
    temp_file
}

/// Spawn the server and return a handle
async fn spawn_server(config_path: &Path) -> tokio::process::Child {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_pixpress"))
        .env("PIXPRESS_CONFIG", config_path)
        .env("RUST_LOG", "error") // Quiet logs during tests
        .kill_on_drop(true)
        .spawn()
        .expect("Failed to spawn server")
}

/// Run the server to completion, expecting it to exit on its own
async fn run_to_exit(config_path: &Path) -> std::process::Output {
    timeout(
        Duration::from_secs(10),
        tokio::process::Command::new(env!("CARGO_BIN_EXE_pixpress"))
            .env("PIXPRESS_CONFIG", config_path)
            .env("RUST_LOG", "error")
            .output(),
    )
    .await
    .expect("Command timed out")
    .expect("Failed to execute command")
}

/// Wait for server to be ready
async fn wait_for_server(port: u16, max_attempts: u32) -> bool {
    let client = Client::new();
    for _ in 0..max_attempts {
        if client
            .get(format!("http://127.0.0.1:{}/api/v1/health", port))
            .send()
            .await
            .is_ok()
        {
            return true;
        }
        sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn test_health_endpoint() {
    let port = get_available_port();
    let bin_root = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, bin_root.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 200).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/health", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["status"], "ok");

    server.kill().await.ok();
}

#[tokio::test]
async fn test_config_endpoint_returns_sanitized() {
    let port = get_available_port();
    let bin_root = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, bin_root.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 200).await,
        "Server did not start in time"
    );

    let client = Client::new();
    let response = client
        .get(format!("http://127.0.0.1:{}/api/v1/config", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let json: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(json["server"]["port"], port);
    assert_eq!(json["resolver"]["bin_root_exists"], true);
    assert_eq!(json["converter"]["avif_quality"], 80);

    server.kill().await.ok();
}

#[tokio::test]
async fn test_metrics_endpoint_serves_prometheus_text() {
    let port = get_available_port();
    let bin_root = TempDir::new().unwrap();
    let config = write_config(&minimal_config(port, bin_root.path()));

    let mut server = spawn_server(config.path()).await;

    assert!(
        wait_for_server(port, 200).await,
        "Server did not start in time"
    );

    let response = Client::new()
        .get(format!("http://127.0.0.1:{}/metrics", port))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("pixpress_http_requests_total"));

    server.kill().await.ok();
}

#[tokio::test]
async fn test_missing_config_file_exits_with_error() {
    let output = run_to_exit(Path::new("/nonexistent/config.toml")).await;

    assert!(!output.status.success());
}

#[tokio::test]
async fn test_invalid_config_exits_with_error() {
    let config = write_config(
        r#"
[batch]
max_parallel = 0
"#,
    );

    let output = run_to_exit(config.path()).await;

    assert!(!output.status.success());
}

#[tokio::test]
async fn test_malformed_config_exits_with_error() {
    let config = write_config("[server\nport = ");

    let output = run_to_exit(config.path()).await;

    assert!(!output.status.success());
}
