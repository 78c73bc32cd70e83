//! Integration tests for the task-triggering endpoints.

mod common;

use axum::http::StatusCode;
use common::TestHarness;
use scraper_core::kernel::MockScraperWorkflow;
use scraper_core::server::routes::JobStartedResponse;
use serde_json::json;
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn generate_seo_runs_to_completion(ctx: &TestHarness) {
    let started = ctx.post("/generate-seo", json!({ "product_id": "123" })).await;
    assert_eq!(started.status, StatusCode::OK);

    let response: JobStartedResponse = started.json();
    assert_eq!(response.status, "started");
    assert_eq!(response.message, "generate_seo_content job started");

    let job = ctx.wait_for_job(response.job_id.as_str()).await;
    assert_eq!(job.get("status"), "completed");
    assert_eq!(job.get("function"), "generate_seo_content");
    assert_eq!(job.get("args"), json!({ "product_id": "123" }));
    assert_eq!(
        job.get("result"),
        json!({ "task": "generate_seo_content", "args": { "product_id": "123" } })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn product_endpoints_require_product_id(ctx: &TestHarness) {
    for uri in ["/generate-seo", "/generate-article", "/optimize-images"] {
        for body in [json!({}), json!({ "product_id": "" }), json!({ "product_id": null })] {
            let response = ctx.post(uri, body).await;
            assert_eq!(response.status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(
                response.body,
                json!({ "error": "Missing required parameter: product_id" })
            );
        }
    }

    assert!(ctx.job_store.is_empty());
    assert!(ctx.workflow.calls().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn numeric_product_id_is_accepted(ctx: &TestHarness) {
    let started = ctx.post("/optimize-images", json!({ "product_id": 77 })).await;
    assert_eq!(started.status, StatusCode::OK);

    let job = ctx.wait_for_job(&started.job_id()).await;
    assert_eq!(
        job.get("args"),
        json!({ "product_id": "77", "upload_to_cloudflare": false })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn process_urls_applies_defaults(ctx: &TestHarness) {
    let started = ctx.post_raw("/process-urls", "").await;
    assert_eq!(started.status, StatusCode::OK);
    ctx.wait_for_job(&started.job_id()).await;

    let calls = ctx.workflow.calls_to("process_urls");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        json!({ "max_workers": 3, "use_proxies": false, "timeout": 30.0 })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn process_urls_passes_overrides(ctx: &TestHarness) {
    let started = ctx
        .post(
            "/process-urls",
            json!({ "max_workers": 8, "use_proxies": true, "timeout": 90 }),
        )
        .await;
    let job = ctx.wait_for_job(&started.job_id()).await;

    assert_eq!(
        job.get("args"),
        json!({ "max_workers": 8, "use_proxies": true, "timeout": 90 })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn process_urls_accepts_fractional_timeout(ctx: &TestHarness) {
    let started = ctx.post("/process-urls", json!({ "timeout": 2.5 })).await;
    assert_eq!(started.status, StatusCode::OK);

    let job = ctx.wait_for_job(&started.job_id()).await;
    assert_eq!(job.get("status"), "completed");
    assert_eq!(job.get("args")["timeout"], json!(2.5));

    let calls = ctx.workflow.calls_to("process_urls");
    assert_eq!(calls[0].args["timeout"], json!(2.5));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn process_urls_rejects_negative_timeout(ctx: &TestHarness) {
    let response = ctx.post("/process-urls", json!({ "timeout": -3 })).await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(ctx.job_store.is_empty());
    assert!(ctx.workflow.calls().is_empty());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn generate_article_applies_defaults(ctx: &TestHarness) {
    let started = ctx
        .post("/generate-article", json!({ "product_id": "abc" }))
        .await;
    assert_eq!(started.get("message"), "generate_seo_articles job started");
    ctx.wait_for_job(&started.job_id()).await;

    let calls = ctx.workflow.calls_to("generate_seo_articles");
    assert_eq!(
        calls[0].args,
        json!({ "product_id": "abc", "language": "en", "save_prompt_only": false })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn generate_article_passes_overrides(ctx: &TestHarness) {
    let started = ctx
        .post(
            "/generate-article",
            json!({ "product_id": "1", "language": "de", "save_prompt_only": true }),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);
    ctx.wait_for_job(&started.job_id()).await;

    let calls = ctx.workflow.calls_to("generate_seo_articles");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        json!({ "product_id": "1", "language": "de", "save_prompt_only": true })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn optimize_images_passes_upload_flag(ctx: &TestHarness) {
    let started = ctx
        .post(
            "/optimize-images",
            json!({ "product_id": "1", "upload_to_cloudflare": true }),
        )
        .await;
    assert_eq!(started.status, StatusCode::OK);
    ctx.wait_for_job(&started.job_id()).await;

    let calls = ctx.workflow.calls_to("optimize_images");
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0].args,
        json!({ "product_id": "1", "upload_to_cloudflare": true })
    );
}

#[test_context(TestHarness)]
#[tokio::test]
async fn scrape_without_limit_passes_null(ctx: &TestHarness) {
    let started = ctx.post("/scrape", json!({})).await;
    let job = ctx.wait_for_job(&started.job_id()).await;

    assert_eq!(job.get("function"), "scrape_new_products");
    assert_eq!(job.get("args"), json!({ "max_pages": null }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn malformed_bodies_are_rejected(ctx: &TestHarness) {
    let response = ctx.post_raw("/scrape", "{not json").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert!(response
        .get("error")
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));

    let response = ctx.post("/generate-seo", json!(["123"])).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);

    assert!(ctx.job_store.is_empty());
}

#[tokio::test]
async fn list_processed_returns_workflow_result() {
    let workflow = MockScraperWorkflow::new().with_response(
        "list_processed_urls",
        json!(["https://example.com/a", "https://example.com/b"]),
    );
    let ctx = TestHarness::with_workflow(workflow);

    let response = ctx.get("/list-processed").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body,
        json!(["https://example.com/a", "https://example.com/b"])
    );
    assert!(ctx.job_store.is_empty());
}

#[tokio::test]
async fn list_processed_failure_is_server_error() {
    let workflow =
        MockScraperWorkflow::new().with_failure("list_processed_urls", "no processed index");
    let ctx = TestHarness::with_workflow(workflow);

    let response = ctx.get("/list-processed").await;

    assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        response.get("error"),
        "Workflow error: no processed index"
    );
}
