//! Job record model for dispatched workflow tasks.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Enums
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// Whether no further transitions can happen from this status
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// How job identifiers are generated at dispatch time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JobIdScheme {
    /// Unix time in whole seconds. Two dispatches in the same second collide.
    #[default]
    Timestamp,
    /// Unix seconds plus a random suffix.
    Unique,
}

impl std::str::FromStr for JobIdScheme {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "timestamp" => Ok(JobIdScheme::Timestamp),
            "unique" => Ok(JobIdScheme::Unique),
            other => anyhow::bail!("unknown job id scheme: {other}"),
        }
    }
}

// ============================================================================
// Job ID
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Generate an id for a job dispatched at `at`.
    pub fn generate(scheme: JobIdScheme, at: DateTime<Utc>) -> Self {
        let secs = at.timestamp();
        match scheme {
            JobIdScheme::Timestamp => Self(secs.to_string()),
            JobIdScheme::Unique => {
                let suffix = Uuid::new_v4().simple().to_string();
                Self(format!("{}-{}", secs, &suffix[..8]))
            }
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for JobId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Job Record
// ============================================================================

/// Status entry for one dispatched task.
///
/// `result` is only present once completed, `error` only once failed, and
/// `completed_at` only in either terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: JobId,
    pub status: JobStatus,
    #[serde(rename = "function")]
    pub function_name: String,
    #[serde(rename = "args")]
    pub arguments: serde_json::Value,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Dispatch generation that owns this record.
    #[serde(skip)]
    pub(crate) generation: u64,
}

impl JobRecord {
    /// Create a record already in the running state.
    pub fn running(
        id: JobId,
        function_name: impl Into<String>,
        arguments: serde_json::Value,
        started_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            status: JobStatus::Running,
            function_name: function_name.into(),
            arguments,
            started_at,
            completed_at: None,
            result: None,
            error: None,
            generation: 0,
        }
    }

    /// Move to `completed`. Returns false if already terminal.
    pub fn mark_completed(&mut self, result: serde_json::Value, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Completed;
        self.completed_at = Some(at);
        self.result = Some(result);
        true
    }

    /// Move to `failed`. Returns false if already terminal.
    pub fn mark_failed(&mut self, error: impl Into<String>, at: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = JobStatus::Failed;
        self.completed_at = Some(at);
        self.error = Some(error.into());
        true
    }

    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }
}
