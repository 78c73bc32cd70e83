//! Read endpoints over the job table.

use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    Json,
};

use crate::kernel::jobs::{JobId, JobRecord};
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

/// `GET /jobs/:job_id` - a single job record
pub async fn get_job_handler(
    State(state): State<AxumAppState>,
    Path(job_id): Path<String>,
) -> Result<Json<JobRecord>, ApiError> {
    state
        .server_deps
        .job_store()
        .get(&JobId::from(job_id))
        .map(Json)
        .ok_or(ApiError::JobNotFound)
}

/// `GET /jobs` - every job record keyed by id
pub async fn list_jobs_handler(
    State(state): State<AxumAppState>,
) -> Json<BTreeMap<String, JobRecord>> {
    Json(state.server_deps.job_store().all())
}
