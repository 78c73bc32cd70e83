//! Job infrastructure for background workflow tasks.
//!
//! This module provides the kernel-level infrastructure for job tracking:
//! - [`JobRecord`] - Status entry for one dispatched task
//! - [`JobStore`] - In-memory table of all job records
//! - [`JobDispatcher`] - Spawns tasks and records their lifecycle
//! - [`spawn_retention_sweeper`] - Optional pruning of finished records
//!
//! # Architecture
//!
//! ```text
//! POST /generate-seo
//!     │
//!     └─► JobDispatcher.dispatch("generate_seo_content", args, task)
//!             ├─► JobStore.insert_running → status: running
//!             └─► tokio task → completed | failed
//!
//! GET /jobs/{id}
//!     │
//!     └─► JobStore.get (snapshot)
//! ```

mod dispatcher;
mod job;
mod job_store;
mod retention;

pub use dispatcher::{DispatchError, DispatcherConfig, JobDispatcher};
pub use job::{JobId, JobIdScheme, JobRecord, JobStatus};
pub use job_store::JobStore;
pub use retention::spawn_retention_sweeper;
