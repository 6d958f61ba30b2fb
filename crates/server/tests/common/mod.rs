//! Common test utilities for in-process API testing with mocks.
//!
//! The fixture wires a real `FormatConverter` and `CapabilityResolver` to a
//! `MockExecutor`, so encoder "binaries" are empty stubs in a temp directory
//! and their behavior is scripted per test.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pixpress_core::{
    testing::{MockExecutor, MockImageEditor},
    BatchConfig, Config, ConverterConfig, FormatConverter, ResolverConfig, ServerConfig,
};

/// Re-export fixtures for test convenience
pub use pixpress_core::testing::fixtures;

/// Test fixture with scripted encoders.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_convert() {
///     let fixture = TestFixture::with_binaries(&["cwebp"]);
///     fixture.executor.on_encoder("cwebp", |request| { ... }).await;
///
///     let response = fixture.post("/api/v1/convert", json!({
///         "path": fixture.image("a.jpg", 1000),
///         "operation": "webp"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock executor - script encoder behavior
    pub executor: Arc<MockExecutor>,
    /// Mock image editor - control dimensions and resizes
    pub editor: Arc<MockImageEditor>,
    /// Holds the bin root and image directory
    pub temp_dir: TempDir,
    /// Directory for test images
    pub images: PathBuf,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a fixture with no encoders installed.
    pub fn new() -> Self {
        Self::with_binaries(&[])
    }

    /// Create a fixture with stub binaries for `binaries`.
    pub fn with_binaries(binaries: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let bin_root = temp_dir.path().join("bin");
        let images = temp_dir.path().join("images");
        std::fs::create_dir_all(&bin_root).expect("Failed to create bin root");
        std::fs::create_dir_all(&images).expect("Failed to create image dir");
        for binary in binaries {
            fixtures::install_stub_binary(&bin_root, binary).expect("Failed to install stub");
        }

        let config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
            },
            resolver: ResolverConfig::with_bin_root(&bin_root),
            converter: ConverterConfig::default(),
            batch: BatchConfig::default().with_max_parallel(2),
            ..Default::default()
        };

        let executor = Arc::new(MockExecutor::new());
        let editor = Arc::new(MockImageEditor::new());
        let resolver = Arc::new(fixtures::resolver_for(&bin_root, executor.clone()));
        let converter = Arc::new(FormatConverter::new(
            config.converter.clone(),
            Arc::clone(&resolver),
            executor.clone(),
            editor.clone(),
        ));

        let state = Arc::new(pixpress_server::state::AppState::new(
            config, resolver, converter,
        ));
        let router = pixpress_server::api::create_router(state);

        Self {
            router,
            executor,
            editor,
            temp_dir,
            images,
        }
    }

    /// Write a test image of `size` bytes and return its path.
    pub fn image(&self, name: &str, size: usize) -> PathBuf {
        fixtures::write_file(&self.images, name, size).expect("Failed to write image")
    }

    /// Install another stub binary after construction.
    pub fn install(&self, binary: &str) {
        fixtures::install_stub_binary(&self.temp_dir.path().join("bin"), binary)
            .expect("Failed to install stub");
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Fetch a path and return the raw body text.
    pub async fn get_text(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        self.send(request_builder.body(body).unwrap()).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}

/// Helper to assert a JSON path equals expected value.
#[macro_export]
macro_rules! assert_json_path {
    ($json:expr, $path:expr, $expected:expr) => {
        let actual = &$json[$path];
        assert_eq!(
            actual, &$expected,
            "Path '{}' expected {:?}, got {:?}",
            $path, $expected, actual
        );
    };
}
