//! Test harness for driving the HTTP router in-process.
//!
//! Requests go straight through the axum `Router` with `oneshot`, so no
//! socket is bound. The workflow is a `MockScraperWorkflow` the test can
//! configure and inspect.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use scraper_core::kernel::jobs::{DispatcherConfig, JobDispatcher, JobStore};
use scraper_core::kernel::{MockScraperWorkflow, ServerDeps};
use scraper_core::server::{build_app, build_state, AxumAppState};
use scraper_core::Config;
use serde::de::DeserializeOwned;
use serde_json::Value;
use test_context::AsyncTestContext;
use tower::ServiceExt;

/// Result of an HTTP call against the router.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl ApiResponse {
    /// Gets a value at the given dotted JSON path.
    pub fn get(&self, path: &str) -> Value {
        let mut current = &self.body;
        for key in path.split('.') {
            current = &current[key];
        }
        current.clone()
    }

    /// Decode the body into a typed response.
    pub fn json<T: DeserializeOwned>(&self) -> T {
        serde_json::from_value(self.body.clone())
            .unwrap_or_else(|e| panic!("unexpected body {}: {}", self.body, e))
    }

    /// The `job_id` of a job-started response.
    pub fn job_id(&self) -> String {
        self.body["job_id"]
            .as_str()
            .unwrap_or_else(|| panic!("no job_id in response: {}", self.body))
            .to_string()
    }
}

pub struct TestHarness {
    pub app: Router,
    pub workflow: Arc<MockScraperWorkflow>,
    pub job_store: JobStore,
}

impl AsyncTestContext for TestHarness {
    async fn setup() -> Self {
        Self::new()
    }
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_workflow(MockScraperWorkflow::new())
    }

    pub fn with_workflow(workflow: MockScraperWorkflow) -> Self {
        init_tracing();
        let workflow = Arc::new(workflow);
        let state = AxumAppState::with_workflow(workflow.clone());
        Self::from_state(state, workflow)
    }

    pub fn with_config(workflow: MockScraperWorkflow, config: DispatcherConfig) -> Self {
        init_tracing();
        let workflow = Arc::new(workflow);
        let dispatcher = JobDispatcher::with_config(JobStore::new(), config);
        let state = AxumAppState::new(ServerDeps::new(workflow.clone(), dispatcher));
        Self::from_state(state, workflow)
    }

    /// Start the way the server binary does, from environment-style settings.
    pub async fn from_env_pairs(workflow: MockScraperWorkflow, pairs: &[(&str, &str)]) -> Self {
        init_tracing();
        let config = Config::from_lookup(|key| {
            pairs
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        })
        .unwrap();
        let workflow = Arc::new(workflow);
        let state = build_state(&config, workflow.clone()).await.unwrap();
        Self::from_state(state, workflow)
    }

    fn from_state(state: AxumAppState, workflow: Arc<MockScraperWorkflow>) -> Self {
        Self {
            job_store: state.server_deps.job_store().clone(),
            app: build_app(state),
            workflow,
        }
    }

    pub async fn get(&self, uri: &str) -> ApiResponse {
        self.send(Method::GET, uri, Body::empty()).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> ApiResponse {
        let body = Body::from(serde_json::to_vec(&body).unwrap());
        self.send(Method::POST, uri, body).await
    }

    pub async fn post_raw(&self, uri: &str, body: &str) -> ApiResponse {
        self.send(Method::POST, uri, Body::from(body.to_string())).await
    }

    async fn send(&self, method: Method, uri: &str, body: Body) -> ApiResponse {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(body)
            .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        ApiResponse { status, body }
    }

    /// Poll `GET /jobs/:job_id` until the job reaches a terminal state.
    pub async fn wait_for_job(&self, job_id: &str) -> ApiResponse {
        let uri = format!("/jobs/{}", job_id);
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                let response = self.get(&uri).await;
                let status = response.get("status");
                if status == "completed" || status == "failed" {
                    return response;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("job {} did not finish in time", job_id))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
