//! Job dispatcher for launching workflow tasks in the background.
//!
//! The `JobDispatcher`:
//! - Generates a job id for each dispatch
//! - Inserts a `running` record before the task starts
//! - Spawns the task on its own tokio task and returns immediately
//! - Records the outcome (completed/failed) when the task ends
//!
//! # Architecture
//!
//! ```text
//! handler
//!     │
//!     └─► JobDispatcher::dispatch(name, args, future)
//!             ├─► JobStore::insert_running   (on the caller)
//!             ├─► tokio::spawn(future)        (the task)
//!             └─► tokio::spawn(supervise)     (awaits the task, writes outcome)
//! ```
//!
//! # Example
//!
//! ```ignore
//! let job_id = dispatcher.dispatch(
//!     "analyze_raw_data",
//!     json!({}),
//!     async move { workflow.analyze_raw_data().await },
//! )?;
//! ```

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, error, info, warn};

use super::job::{JobId, JobIdScheme};
use super::job_store::JobStore;

/// Configuration for the job dispatcher.
#[derive(Debug, Clone, Default)]
pub struct DispatcherConfig {
    /// How job ids are generated
    pub id_scheme: JobIdScheme,
    /// Maximum number of jobs running at once (None = unbounded)
    pub max_concurrent_jobs: Option<usize>,
}

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Too many running jobs (limit {limit})")]
    Saturated { limit: usize },
}

/// Launches tasks off the request path and tracks them in a [`JobStore`].
#[derive(Clone)]
pub struct JobDispatcher {
    store: JobStore,
    config: DispatcherConfig,
    permits: Option<Arc<Semaphore>>,
}

impl JobDispatcher {
    /// Create a dispatcher with default configuration.
    pub fn new(store: JobStore) -> Self {
        Self::with_config(store, DispatcherConfig::default())
    }

    /// Create with custom configuration.
    pub fn with_config(store: JobStore, config: DispatcherConfig) -> Self {
        let permits = config
            .max_concurrent_jobs
            .map(|limit| Arc::new(Semaphore::new(limit)));
        Self {
            store,
            config,
            permits,
        }
    }

    pub fn store(&self) -> &JobStore {
        &self.store
    }

    /// Dispatch a task and return its job id without waiting for it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch<F>(
        &self,
        function_name: &'static str,
        arguments: serde_json::Value,
        task: F,
    ) -> Result<JobId, DispatchError>
    where
        F: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        self.dispatch_at(Utc::now(), function_name, arguments, task)
    }

    pub(crate) fn dispatch_at<F>(
        &self,
        now: DateTime<Utc>,
        function_name: &'static str,
        arguments: serde_json::Value,
        task: F,
    ) -> Result<JobId, DispatchError>
    where
        F: Future<Output = anyhow::Result<serde_json::Value>> + Send + 'static,
    {
        let permit = self.acquire_permit()?;

        let job_id = JobId::generate(self.config.id_scheme, now);
        let generation = self
            .store
            .insert_running(job_id.clone(), function_name, arguments, now);

        debug!(job_id = %job_id, function = function_name, "job dispatched");

        let handle = tokio::spawn(task);
        tokio::spawn(supervise(
            self.store.clone(),
            job_id.clone(),
            generation,
            function_name,
            handle,
            permit,
        ));

        Ok(job_id)
    }

    fn acquire_permit(&self) -> Result<Option<OwnedSemaphorePermit>, DispatchError> {
        let Some(permits) = &self.permits else {
            return Ok(None);
        };
        let limit = self.config.max_concurrent_jobs.unwrap_or_default();
        permits
            .clone()
            .try_acquire_owned()
            .map(Some)
            .map_err(|_| DispatchError::Saturated { limit })
    }
}

/// Await a spawned task and write its outcome into the store.
///
/// The permit (if any) is held until the outcome is recorded.
async fn supervise(
    store: JobStore,
    job_id: JobId,
    generation: u64,
    function_name: &'static str,
    handle: JoinHandle<anyhow::Result<serde_json::Value>>,
    _permit: Option<OwnedSemaphorePermit>,
) {
    let outcome = handle.await;
    let finished_at = Utc::now();

    let recorded = match outcome {
        Ok(Ok(result)) => {
            info!(job_id = %job_id, function = function_name, "job completed");
            store.complete(&job_id, generation, result, finished_at)
        }
        Ok(Err(e)) => {
            error!(job_id = %job_id, function = function_name, error = ?e, "job failed");
            store.fail(&job_id, generation, format!("{e:#}"), finished_at)
        }
        Err(join_error) => {
            let message = join_error_message(join_error);
            error!(job_id = %job_id, function = function_name, error = %message, "job aborted");
            store.fail(&job_id, generation, message, finished_at)
        }
    };

    if !recorded {
        warn!(
            job_id = %job_id,
            function = function_name,
            "job outcome dropped, record was replaced"
        );
    }
}

fn join_error_message(join_error: JoinError) -> String {
    if join_error.is_cancelled() {
        return "task was cancelled".to_string();
    }
    format!("task panicked: {}", panic_message(join_error.into_panic()))
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
