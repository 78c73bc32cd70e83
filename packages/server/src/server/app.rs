//! Application setup and server configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::kernel::jobs::{spawn_retention_sweeper, JobDispatcher, JobStore};
use crate::kernel::{BaseScraperWorkflow, ServerDeps};
use crate::server::routes::{
    analyze_handler, extract_data_handler, generate_article_handler, generate_seo_handler,
    get_job_handler, health_handler, list_jobs_handler, list_processed_handler,
    optimize_images_handler, process_urls_handler, scrape_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AxumAppState {
    pub server_deps: Arc<ServerDeps>,
}

impl AxumAppState {
    pub fn new(server_deps: ServerDeps) -> Self {
        Self {
            server_deps: Arc::new(server_deps),
        }
    }

    /// State with a fresh, empty job table and default dispatcher settings
    pub fn with_workflow(workflow: Arc<dyn BaseScraperWorkflow>) -> Self {
        Self::new(ServerDeps::new(
            workflow,
            JobDispatcher::new(JobStore::new()),
        ))
    }
}

/// Prepare the workflow and job table for serving.
///
/// Runs `setup_directories` once, starts the retention sweeper when
/// configured and applies the dispatcher limits from `config`.
pub async fn build_state(
    config: &Config,
    workflow: Arc<dyn BaseScraperWorkflow>,
) -> Result<AxumAppState> {
    workflow
        .setup_directories()
        .await
        .context("Failed to set up workflow directories")?;

    // Job table lives for the whole process
    let job_store = JobStore::new();
    if let Some(retention) = config.job_retention {
        spawn_retention_sweeper(job_store.clone(), retention);
    }
    let dispatcher = JobDispatcher::with_config(job_store, config.dispatcher_config());

    Ok(AxumAppState::new(ServerDeps::new(workflow, dispatcher)))
}

/// Build the Axum application router
pub fn build_app(state: AxumAppState) -> Router {
    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE]);

    Router::new()
        // Health check
        .route("/health", get(health_handler))
        // Job polling
        .route("/jobs", get(list_jobs_handler))
        .route("/jobs/:job_id", get(get_job_handler))
        // Task triggers
        .route("/scrape", post(scrape_handler))
        .route("/process-urls", post(process_urls_handler))
        .route("/analyze", post(analyze_handler))
        .route("/extract-data", post(extract_data_handler))
        .route("/generate-seo", post(generate_seo_handler))
        .route("/generate-article", post(generate_article_handler))
        .route("/optimize-images", post(optimize_images_handler))
        // Synchronous reads
        .route("/list-processed", get(list_processed_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
