//! Server dependencies for handlers (using traits for testability)
//!
//! This module provides the dependency container built by the composition root
//! and shared by every route. The workflow is a trait object so tests can swap
//! in [`MockScraperWorkflow`](super::MockScraperWorkflow).

use std::sync::Arc;

use crate::kernel::jobs::{JobDispatcher, JobStore};
use crate::kernel::BaseScraperWorkflow;

// =============================================================================
// ServerDeps
// =============================================================================

/// Server dependencies accessible to route handlers
#[derive(Clone)]
pub struct ServerDeps {
    pub workflow: Arc<dyn BaseScraperWorkflow>,
    pub jobs: JobDispatcher,
}

impl ServerDeps {
    pub fn new(workflow: Arc<dyn BaseScraperWorkflow>, jobs: JobDispatcher) -> Self {
        Self { workflow, jobs }
    }

    /// The job table behind the dispatcher
    pub fn job_store(&self) -> &JobStore {
        self.jobs.store()
    }
}
