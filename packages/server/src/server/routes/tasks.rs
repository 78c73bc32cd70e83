//! Task-triggering endpoints.
//!
//! Each handler parses its parameters, validates required ones, and hands
//! the matching workflow call to the [`JobDispatcher`](crate::kernel::jobs::JobDispatcher).
//! The response only says the job started; progress is read from `/jobs/:job_id`.

use std::future::Future;

use axum::{body::Bytes, extract::State, Json};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Number, Value};
use tracing::info;

use crate::kernel::jobs::JobId;
use crate::server::app::AxumAppState;
use crate::server::error::ApiError;

const DEFAULT_MAX_WORKERS: u32 = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_LANGUAGE: &str = "en";

// =============================================================================
// Request / response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct JobStartedResponse {
    pub job_id: JobId,
    pub status: String,
    pub message: String,
}

impl JobStartedResponse {
    fn new(job_id: JobId, function_name: &str) -> Self {
        Self {
            job_id,
            status: "started".to_string(),
            message: format!("{} job started", function_name),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScrapeParams {
    pub max_pages: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProcessUrlsParams {
    pub max_workers: Option<u32>,
    pub use_proxies: Option<bool>,
    pub timeout: Option<Number>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateSeoParams {
    pub product_id: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GenerateArticleParams {
    pub product_id: Option<Value>,
    pub language: Option<String>,
    pub save_prompt_only: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OptimizeImagesParams {
    pub product_id: Option<Value>,
    pub upload_to_cloudflare: Option<bool>,
}

// =============================================================================
// Parameter parsing
// =============================================================================

/// Parse a JSON object body. An empty body or `null` counts as `{}`.
pub fn parse_params<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    let value: Value = if body.iter().all(u8::is_ascii_whitespace) {
        Value::Null
    } else {
        serde_json::from_slice(body).map_err(|e| ApiError::InvalidBody(e.to_string()))?
    };

    let object = match value {
        Value::Null => Value::Object(Default::default()),
        Value::Object(_) => value,
        _ => {
            return Err(ApiError::InvalidBody(
                "expected a JSON object".to_string(),
            ))
        }
    };

    serde_json::from_value(object).map_err(|e| ApiError::InvalidBody(e.to_string()))
}

/// Validate the `timeout` seconds. Fractions are allowed, negatives are not.
pub fn parse_timeout(value: &Number) -> Result<f64, ApiError> {
    match value.as_f64() {
        Some(secs) if secs.is_finite() && secs >= 0.0 => Ok(secs),
        _ => Err(ApiError::InvalidBody(
            "timeout must be a non-negative number of seconds".to_string(),
        )),
    }
}

/// Validate a required `product_id`.
///
/// Absent, null, empty, zero and false all count as missing. Numbers are
/// passed on in their decimal form.
pub fn require_product_id(value: Option<Value>) -> Result<String, ApiError> {
    const FIELD: &str = "product_id";

    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => {
            Err(ApiError::MissingParameter(FIELD))
        }
        Some(Value::String(s)) if s.is_empty() => Err(ApiError::MissingParameter(FIELD)),
        Some(Value::String(s)) => Ok(s),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => {
            Err(ApiError::MissingParameter(FIELD))
        }
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(Value::Array(a)) if a.is_empty() => Err(ApiError::MissingParameter(FIELD)),
        Some(Value::Object(o)) if o.is_empty() => Err(ApiError::MissingParameter(FIELD)),
        Some(_) => Err(ApiError::InvalidBody(
            "product_id must be a string or a number".to_string(),
        )),
    }
}

fn start_job<F>(
    state: &AxumAppState,
    function_name: &'static str,
    arguments: Value,
    task: F,
) -> Result<Json<JobStartedResponse>, ApiError>
where
    F: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    let job_id = state
        .server_deps
        .jobs
        .dispatch(function_name, arguments, task)?;
    Ok(Json(JobStartedResponse::new(job_id, function_name)))
}

// =============================================================================
// Handlers
// =============================================================================

/// `POST /scrape`
pub async fn scrape_handler(
    State(state): State<AxumAppState>,
    body: Bytes,
) -> Result<Json<JobStartedResponse>, ApiError> {
    let params: ScrapeParams = parse_params(&body)?;
    let max_pages = params.max_pages;

    info!(max_pages = ?max_pages, "Starting scrape job");

    let workflow = state.server_deps.workflow.clone();
    start_job(
        &state,
        "scrape_new_products",
        json!({ "max_pages": max_pages }),
        async move { workflow.scrape_new_products(max_pages).await },
    )
}

/// `POST /process-urls`
pub async fn process_urls_handler(
    State(state): State<AxumAppState>,
    body: Bytes,
) -> Result<Json<JobStartedResponse>, ApiError> {
    let params: ProcessUrlsParams = parse_params(&body)?;
    let max_workers = params.max_workers.unwrap_or(DEFAULT_MAX_WORKERS);
    let use_proxies = params.use_proxies.unwrap_or(false);
    let timeout = params
        .timeout
        .unwrap_or_else(|| Number::from(DEFAULT_TIMEOUT_SECS));
    let timeout_secs = parse_timeout(&timeout)?;

    info!(max_workers, use_proxies, timeout = %timeout, "Starting process URLs job");

    let workflow = state.server_deps.workflow.clone();
    start_job(
        &state,
        "process_urls",
        json!({
            "max_workers": max_workers,
            "use_proxies": use_proxies,
            "timeout": timeout,
        }),
        async move {
            workflow
                .process_urls(max_workers, use_proxies, timeout_secs)
                .await
        },
    )
}

/// `POST /analyze`
pub async fn analyze_handler(
    State(state): State<AxumAppState>,
) -> Result<Json<JobStartedResponse>, ApiError> {
    info!("Starting analysis job");

    let workflow = state.server_deps.workflow.clone();
    start_job(&state, "analyze_raw_data", json!({}), async move {
        workflow.analyze_raw_data().await
    })
}

/// `POST /extract-data`
pub async fn extract_data_handler(
    State(state): State<AxumAppState>,
) -> Result<Json<JobStartedResponse>, ApiError> {
    info!("Starting data extraction job");

    let workflow = state.server_deps.workflow.clone();
    start_job(&state, "extract_additional_data", json!({}), async move {
        workflow.extract_additional_data().await
    })
}

/// `POST /generate-seo`
pub async fn generate_seo_handler(
    State(state): State<AxumAppState>,
    body: Bytes,
) -> Result<Json<JobStartedResponse>, ApiError> {
    let params: GenerateSeoParams = parse_params(&body)?;
    let product_id = require_product_id(params.product_id)?;

    info!(product_id = %product_id, "Starting SEO content generation");

    let workflow = state.server_deps.workflow.clone();
    start_job(
        &state,
        "generate_seo_content",
        json!({ "product_id": product_id }),
        async move { workflow.generate_seo_content(&product_id).await },
    )
}

/// `POST /generate-article`
pub async fn generate_article_handler(
    State(state): State<AxumAppState>,
    body: Bytes,
) -> Result<Json<JobStartedResponse>, ApiError> {
    let params: GenerateArticleParams = parse_params(&body)?;
    let product_id = require_product_id(params.product_id)?;
    let language = params
        .language
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    let save_prompt_only = params.save_prompt_only.unwrap_or(false);

    info!(product_id = %product_id, language = %language, save_prompt_only, "Starting article generation");

    let workflow = state.server_deps.workflow.clone();
    start_job(
        &state,
        "generate_seo_articles",
        json!({
            "product_id": product_id,
            "language": language,
            "save_prompt_only": save_prompt_only,
        }),
        async move {
            workflow
                .generate_seo_articles(&product_id, &language, save_prompt_only)
                .await
        },
    )
}

/// `POST /optimize-images`
pub async fn optimize_images_handler(
    State(state): State<AxumAppState>,
    body: Bytes,
) -> Result<Json<JobStartedResponse>, ApiError> {
    let params: OptimizeImagesParams = parse_params(&body)?;
    let product_id = require_product_id(params.product_id)?;
    let upload_to_cloudflare = params.upload_to_cloudflare.unwrap_or(false);

    info!(product_id = %product_id, upload_to_cloudflare, "Starting image optimization");

    let workflow = state.server_deps.workflow.clone();
    start_job(
        &state,
        "optimize_images",
        json!({
            "product_id": product_id,
            "upload_to_cloudflare": upload_to_cloudflare,
        }),
        async move {
            workflow
                .optimize_images(&product_id, upload_to_cloudflare)
                .await
        },
    )
}

/// `GET /list-processed` - calls straight through, no job tracking
pub async fn list_processed_handler(
    State(state): State<AxumAppState>,
) -> Result<Json<Value>, ApiError> {
    info!("Listing processed URLs");

    let result = state.server_deps.workflow.list_processed_urls().await?;
    Ok(Json(result))
}
