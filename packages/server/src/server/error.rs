use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::kernel::jobs::DispatchError;

/// Error response format shared by handlers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Errors returned by route handlers
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid request body: {0}")]
    InvalidBody(String),

    #[error("Job not found")]
    JobNotFound,

    #[error("Too many running jobs (limit {limit})")]
    Saturated { limit: usize },

    #[error("Workflow error: {0:#}")]
    Workflow(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingParameter(_) | ApiError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ApiError::JobNotFound => StatusCode::NOT_FOUND,
            ApiError::Saturated { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Workflow(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DispatchError> for ApiError {
    fn from(error: DispatchError) -> Self {
        match error {
            DispatchError::Saturated { limit } => ApiError::Saturated { limit },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match &self {
            ApiError::Workflow(e) => tracing::error!(error = ?e, "workflow call failed"),
            ApiError::Saturated { limit } => tracing::warn!(limit, "rejecting job, dispatcher saturated"),
            _ => tracing::debug!(status = %status, error = %self, "request rejected"),
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}
