//! In-memory job table shared by the dispatcher and the HTTP layer.
//!
//! Records are created by the dispatching request and afterwards only
//! mutated by the task that owns them. Every read returns a snapshot clone,
//! so pollers never hold the lock across an await.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::warn;

use super::job::{JobId, JobRecord};

/// Process-wide mapping from job id to job record.
#[derive(Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<JobId, JobRecord>>>,
    generations: Arc<AtomicU64>,
}

impl JobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a running record and return the generation that owns it.
    ///
    /// An existing record under the same id is replaced.
    pub fn insert_running(
        &self,
        id: JobId,
        function_name: &str,
        arguments: serde_json::Value,
        started_at: DateTime<Utc>,
    ) -> u64 {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed) + 1;
        let mut record = JobRecord::running(id.clone(), function_name, arguments, started_at);
        record.generation = generation;

        let replaced = self
            .jobs
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(id.clone(), record);

        if let Some(previous) = replaced {
            warn!(
                job_id = %id,
                previous_function = %previous.function_name,
                previous_status = ?previous.status,
                "job id collision, replacing existing record"
            );
        }

        generation
    }

    /// Record a successful outcome. Returns false if nothing changed.
    pub fn complete(
        &self,
        id: &JobId,
        generation: u64,
        result: serde_json::Value,
        at: DateTime<Utc>,
    ) -> bool {
        self.update_owned(id, generation, |record| record.mark_completed(result, at))
    }

    /// Record a failure. Returns false if nothing changed.
    pub fn fail(&self, id: &JobId, generation: u64, error: String, at: DateTime<Utc>) -> bool {
        self.update_owned(id, generation, |record| record.mark_failed(error, at))
    }

    fn update_owned(
        &self,
        id: &JobId,
        generation: u64,
        apply: impl FnOnce(&mut JobRecord) -> bool,
    ) -> bool {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        match jobs.get_mut(id) {
            Some(record) if record.generation == generation => apply(record),
            _ => false,
        }
    }

    /// Snapshot of a single record.
    pub fn get(&self, id: &JobId) -> Option<JobRecord> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(id)
            .cloned()
    }

    /// Snapshot of the whole table keyed by id.
    pub fn all(&self) -> BTreeMap<String, JobRecord> {
        self.jobs
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(id, record)| (id.to_string(), record.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.jobs.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove finished records that completed before `cutoff`.
    ///
    /// Running records are always kept.
    pub fn prune_finished_before(&self, cutoff: DateTime<Utc>) -> usize {
        let mut jobs = self.jobs.write().unwrap_or_else(|e| e.into_inner());
        let before = jobs.len();
        jobs.retain(|_, record| match record.completed_at {
            Some(completed_at) => completed_at >= cutoff,
            None => true,
        });
        before - jobs.len()
    }
}
