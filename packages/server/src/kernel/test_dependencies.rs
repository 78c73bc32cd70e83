// TestDependencies - mock implementations for testing
//
// Provides a mock scraper workflow that can be injected into the app state for tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::watch;

use super::BaseScraperWorkflow;

// =============================================================================
// Mock Scraper Workflow
// =============================================================================

/// Arguments captured from a workflow call
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowCall {
    pub task: &'static str,
    pub args: Value,
}

pub struct MockScraperWorkflow {
    responses: Arc<Mutex<HashMap<&'static str, Value>>>,
    failures: Arc<Mutex<HashMap<&'static str, String>>>,
    calls: Arc<Mutex<Vec<WorkflowCall>>>,
    setup_calls: Arc<Mutex<usize>>,
    gate: watch::Sender<bool>,
}

impl Default for MockScraperWorkflow {
    fn default() -> Self {
        Self::new()
    }
}

impl MockScraperWorkflow {
    pub fn new() -> Self {
        let (gate, _) = watch::channel(false);
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
            setup_calls: Arc::new(Mutex::new(0)),
            gate,
        }
    }

    /// Return `value` from `task` instead of the default echo of its arguments
    pub fn with_response(self, task: &'static str, value: Value) -> Self {
        self.responses.lock().unwrap().insert(task, value);
        self
    }

    /// Make `task` fail with `message`
    pub fn with_failure(self, task: &'static str, message: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(task, message.to_string());
        self
    }

    /// Block every task until [`release`](Self::release) is called
    pub fn hold(&self) {
        self.gate.send_replace(true);
    }

    /// Let held and future tasks run
    pub fn release(&self) {
        self.gate.send_replace(false);
    }

    /// Get all calls made so far
    pub fn calls(&self) -> Vec<WorkflowCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Get calls made to one task
    pub fn calls_to(&self, task: &str) -> Vec<WorkflowCall> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.task == task)
            .cloned()
            .collect()
    }

    pub fn setup_calls(&self) -> usize {
        *self.setup_calls.lock().unwrap()
    }

    async fn call(&self, task: &'static str, args: Value) -> Result<Value> {
        self.calls.lock().unwrap().push(WorkflowCall {
            task,
            args: args.clone(),
        });

        let mut gate = self.gate.subscribe();
        gate.wait_for(|held| !*held)
            .await
            .map_err(|_| anyhow!("workflow gate closed"))?;

        if let Some(message) = self.failures.lock().unwrap().get(task) {
            return Err(anyhow!(message.clone()));
        }

        let response = self.responses.lock().unwrap().get(task).cloned();
        Ok(response.unwrap_or_else(|| json!({ "task": task, "args": args })))
    }
}

#[async_trait]
impl BaseScraperWorkflow for MockScraperWorkflow {
    async fn setup_directories(&self) -> Result<()> {
        *self.setup_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn scrape_new_products(&self, max_pages: Option<u32>) -> Result<Value> {
        self.call("scrape_new_products", json!({ "max_pages": max_pages }))
            .await
    }

    async fn process_urls(
        &self,
        max_workers: u32,
        use_proxies: bool,
        timeout_secs: f64,
    ) -> Result<Value> {
        self.call(
            "process_urls",
            json!({
                "max_workers": max_workers,
                "use_proxies": use_proxies,
                "timeout": timeout_secs,
            }),
        )
        .await
    }

    async fn analyze_raw_data(&self) -> Result<Value> {
        self.call("analyze_raw_data", json!({})).await
    }

    async fn extract_additional_data(&self) -> Result<Value> {
        self.call("extract_additional_data", json!({})).await
    }

    async fn generate_seo_content(&self, product_id: &str) -> Result<Value> {
        self.call("generate_seo_content", json!({ "product_id": product_id }))
            .await
    }

    async fn generate_seo_articles(
        &self,
        product_id: &str,
        language: &str,
        save_prompt_only: bool,
    ) -> Result<Value> {
        self.call(
            "generate_seo_articles",
            json!({
                "product_id": product_id,
                "language": language,
                "save_prompt_only": save_prompt_only,
            }),
        )
        .await
    }

    async fn optimize_images(&self, product_id: &str, upload_to_cloudflare: bool) -> Result<Value> {
        self.call(
            "optimize_images",
            json!({
                "product_id": product_id,
                "upload_to_cloudflare": upload_to_cloudflare,
            }),
        )
        .await
    }

    async fn list_processed_urls(&self) -> Result<Value> {
        self.call("list_processed_urls", json!({})).await
    }
}
