// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only. The scraping and generation work lives
// in the external workflow; handlers reach it through these seams.
//
// Naming convention: Base* for trait names (e.g., BaseScraperWorkflow)

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

// =============================================================================
// Scraper Workflow Trait (Infrastructure - long-running product tasks)
// =============================================================================

#[async_trait]
pub trait BaseScraperWorkflow: Send + Sync {
    /// Create the directories the workflow writes into. Called once at startup.
    async fn setup_directories(&self) -> Result<()>;

    /// Scrape listing pages for products not seen before
    async fn scrape_new_products(&self, max_pages: Option<u32>) -> Result<Value>;

    /// Fetch and store the product pages behind queued URLs
    async fn process_urls(&self, max_workers: u32, use_proxies: bool, timeout_secs: f64)
        -> Result<Value>;

    /// Analyze raw scraped data
    async fn analyze_raw_data(&self) -> Result<Value>;

    /// Extract additional structured data from processed pages
    async fn extract_additional_data(&self) -> Result<Value>;

    /// Generate SEO content for a product
    async fn generate_seo_content(&self, product_id: &str) -> Result<Value>;

    /// Generate SEO articles for a product
    ///
    /// With `save_prompt_only` the workflow stores the prompt without calling the model.
    async fn generate_seo_articles(
        &self,
        product_id: &str,
        language: &str,
        save_prompt_only: bool,
    ) -> Result<Value>;

    /// Optimize product images, optionally uploading them to Cloudflare
    async fn optimize_images(&self, product_id: &str, upload_to_cloudflare: bool)
        -> Result<Value>;

    /// List URLs that have already been processed
    async fn list_processed_urls(&self) -> Result<Value>;
}
