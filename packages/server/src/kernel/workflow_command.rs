//! Scraper workflow backed by an external command.
//!
//! Each task runs the workflow program as a subprocess:
//!
//! ```text
//! <program> <base args...> <subcommand> [--flag value ...]
//! ```
//!
//! Stdout is the task result: JSON when it parses, otherwise the trimmed
//! text. A non-zero exit status fails the task with the tail of stderr.

use std::path::PathBuf;
use std::process::Stdio;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use tokio::process::Command;
use tracing::{debug, info};

use super::BaseScraperWorkflow;
use crate::config::Config;

/// Lines of stderr kept in a failure message
const STDERR_TAIL_LINES: usize = 20;

pub struct CommandWorkflow {
    program: String,
    base_args: Vec<String>,
    working_dir: Option<PathBuf>,
    log_dir: PathBuf,
}

impl CommandWorkflow {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            base_args: Vec::new(),
            working_dir: None,
            log_dir: PathBuf::from("logs"),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let workflow = Self::new(config.workflow_program.clone())
            .args(config.workflow_args.iter().cloned())
            .log_dir(config.log_dir.clone());
        match &config.workflow_dir {
            Some(dir) => workflow.working_dir(dir.clone()),
            None => workflow,
        }
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.base_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }

    pub fn log_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_dir = path.into();
        self
    }

    async fn run(&self, subcommand: &str, flags: Flags) -> Result<Value> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.base_args)
            .arg(subcommand)
            .args(&flags.0)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(ref dir) = self.working_dir {
            cmd.current_dir(dir);
        }

        debug!(program = %self.program, subcommand, flags = ?flags.0, "running workflow command");

        let output = cmd
            .output()
            .await
            .with_context(|| format!("Failed to start workflow command `{}`", self.program))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!(
                "workflow `{}` exited with {}: {}",
                subcommand,
                output.status,
                stderr_tail(&stderr)
            );
        }

        Ok(parse_stdout(&output.stdout))
    }
}

/// Command-line flags for one workflow invocation.
#[derive(Default)]
struct Flags(Vec<String>);

impl Flags {
    fn value(mut self, name: &str, value: impl ToString) -> Self {
        self.0.push(name.to_string());
        self.0.push(value.to_string());
        self
    }

    fn maybe(self, name: &str, value: Option<impl ToString>) -> Self {
        match value {
            Some(value) => self.value(name, value),
            None => self,
        }
    }

    /// Boolean switch, only emitted when set
    fn switch(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.0.push(name.to_string());
        }
        self
    }
}

fn parse_stdout(stdout: &[u8]) -> Value {
    let text = String::from_utf8_lossy(stdout);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    serde_json::from_str(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()))
}

fn stderr_tail(stderr: &str) -> String {
    let lines: Vec<&str> = stderr.trim().lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    let tail = lines[start..].join("\n");
    if tail.is_empty() {
        "(no stderr output)".to_string()
    } else {
        tail
    }
}

#[async_trait]
impl BaseScraperWorkflow for CommandWorkflow {
    async fn setup_directories(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.log_dir)
            .await
            .with_context(|| format!("Failed to create log directory {}", self.log_dir.display()))?;
        self.run("setup-directories", Flags::default()).await?;
        info!("workflow directories ready");
        Ok(())
    }

    async fn scrape_new_products(&self, max_pages: Option<u32>) -> Result<Value> {
        let flags = Flags::default().maybe("--max-pages", max_pages);
        self.run("scrape-new-products", flags).await
    }

    async fn process_urls(
        &self,
        max_workers: u32,
        use_proxies: bool,
        timeout_secs: f64,
    ) -> Result<Value> {
        let flags = Flags::default()
            .value("--max-workers", max_workers)
            .value("--timeout", timeout_secs)
            .switch("--use-proxies", use_proxies);
        self.run("process-urls", flags).await
    }

    async fn analyze_raw_data(&self) -> Result<Value> {
        self.run("analyze-raw-data", Flags::default()).await
    }

    async fn extract_additional_data(&self) -> Result<Value> {
        self.run("extract-additional-data", Flags::default()).await
    }

    async fn generate_seo_content(&self, product_id: &str) -> Result<Value> {
        let flags = Flags::default().value("--product-id", product_id);
        self.run("generate-seo-content", flags).await
    }

    async fn generate_seo_articles(
        &self,
        product_id: &str,
        language: &str,
        save_prompt_only: bool,
    ) -> Result<Value> {
        let flags = Flags::default()
            .value("--product-id", product_id)
            .value("--language", language)
            .switch("--save-prompt-only", save_prompt_only);
        self.run("generate-seo-articles", flags).await
    }

    async fn optimize_images(&self, product_id: &str, upload_to_cloudflare: bool) -> Result<Value> {
        let flags = Flags::default()
            .value("--product-id", product_id)
            .switch("--upload-to-cloudflare", upload_to_cloudflare);
        self.run("optimize-images", flags).await
    }

    async fn list_processed_urls(&self) -> Result<Value> {
        self.run("list-processed-urls", Flags::default()).await
    }
}
