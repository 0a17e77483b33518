//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock collaborators injected, so whole import cycles run without
//! any external infrastructure.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use fetchcycle_core::config::{SinkConfig, SourceConfig};
use fetchcycle_core::testing::{MockGetter, MockNotifier, MockStorer};
use fetchcycle_core::{
    Config, CycleConfig, FetchError, Getter, SqliteStatusStore, StatusStore,
};
use fetchcycle_server::state::{AppState, GetterFactory};

/// Test fixture for API testing with mock collaborators.
///
/// Every tenant gets a getter built from the script returned by
/// `TestConfig::records_for`; the storer and notifier are shared.
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock storer - inspect stored payloads, inject failures
    pub storer: Arc<MockStorer>,
    /// Mock notifier - inspect notified documents
    pub notifier: Arc<MockNotifier>,
    /// Status store behind the router
    pub status_store: Arc<SqliteStatusStore>,
    /// Temporary directory for the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Create a new test fixture with source and sink configured.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    /// Create a test fixture with custom configuration.
    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let storer = Arc::new(MockStorer::new());
        let notifier = Arc::new(MockNotifier::new());
        let status_store = Arc::new(
            SqliteStatusStore::new(&db_path).expect("Failed to create status store"),
        );

        let mut config = Config::default();
        config.database.path = db_path;
        config.cycle = CycleConfig::default().with_concurrent_count(2);
        config.cycle.import_type = "vehicle".to_string();
        if test_config.configure_endpoints {
            config.source = Some(SourceConfig {
                url: "http://source.test/records".to_string(),
                token: Some("source-secret".to_string()),
                timeout_secs: 5,
            });
            config.sink = Some(SinkConfig {
                url: "http://sink.test/records".to_string(),
                token: None,
                timeout_secs: 5,
                accept_statuses: vec![200, 400],
            });
        }

        let getter_factory: Option<Arc<dyn GetterFactory>> = if test_config.configure_endpoints {
            let records = test_config.records;
            let fail_tenant = test_config.fail_tenant;
            let factory = move |tenant_id: &str| -> Result<Arc<dyn Getter>, FetchError> {
                let mut getter = MockGetter::new()
                    .with_records(records.clone())
                    .with_item_delay(Duration::from_millis(5));
                if fail_tenant.as_deref() == Some(tenant_id) {
                    getter = getter.with_failure("source unavailable");
                }
                Ok(Arc::new(getter))
            };
            Some(Arc::new(factory) as Arc<dyn GetterFactory>)
        } else {
            None
        };

        let state = Arc::new(AppState::new(
            config,
            Arc::clone(&status_store) as Arc<dyn StatusStore>,
            getter_factory,
            if test_config.configure_endpoints {
                Some(Arc::clone(&storer) as Arc<dyn fetchcycle_core::Storer>)
            } else {
                None
            },
            Arc::clone(&notifier) as Arc<dyn fetchcycle_core::Notifier>,
        ));

        let router = fetchcycle_server::api::create_router(state);

        Self {
            router,
            storer,
            notifier,
            status_store,
            temp_dir,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body)).await
    }

    /// Send a GET request and return the raw body text.
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
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        (status, String::from_utf8_lossy(&body_bytes).to_string())
    }

    /// Poll the status endpoint until the run's final document is stored.
    ///
    /// A failed fetch is persisted as `FAIL` before in-flight stores drain,
    /// so the terminal status alone is not enough: wait for `end_timestamp`.
    pub async fn wait_for_terminal(&self, fetch_id: &str) -> Value {
        for _ in 0..300 {
            let response = self.get(&format!("/api/v1/imports/status/{}", fetch_id)).await;
            if response.status == StatusCode::OK && !response.body["end_timestamp"].is_null() {
                return response.body;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("Import {} did not finish in time", fetch_id);
    }

    /// Send a request to the test server.
    async fn request(&self, method: &str, path: &str, body: Option<Value>) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

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

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Configure source and sink (imports are rejected without them)
    pub configure_endpoints: bool,
    /// Records every tenant's getter yields
    pub records: Vec<Value>,
    /// Tenant whose getter fails after its records
    pub fail_tenant: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            configure_endpoints: true,
            records: vec![
                serde_json::json!({"vin": "A1"}),
                serde_json::json!({"vin": "B2"}),
                serde_json::json!({"vin": "C3"}),
            ],
            fail_tenant: None,
        }
    }
}

impl TestConfig {
    /// Create config without source and sink.
    pub fn without_endpoints() -> Self {
        Self {
            configure_endpoints: false,
            ..Default::default()
        }
    }

    /// Create config where `tenant_id`'s getter fails.
    pub fn failing_tenant(tenant_id: &str) -> Self {
        Self {
            fail_tenant: Some(tenant_id.to_string()),
            ..Default::default()
        }
    }
}

/// Assert a response has the expected status, printing the body otherwise.
pub fn assert_status(response: &TestResponse, status: StatusCode) {
    assert_eq!(
        response.status,
        status,
        "Expected status {:?}, got {:?}. Body: {}",
        status,
        response.status,
        serde_json::to_string_pretty(&response.body).unwrap_or_default()
    );
}
