use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use dotenvy::dotenv;

use crate::kernel::jobs::{DispatcherConfig, JobIdScheme};

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub workflow_program: String,
    pub workflow_args: Vec<String>,
    pub workflow_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub job_id_scheme: JobIdScheme,
    pub max_concurrent_jobs: Option<usize>,
    pub job_retention: Option<Duration>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let max_concurrent_jobs = match var("MAX_CONCURRENT_JOBS") {
            Some(raw) => {
                let limit: usize = raw
                    .trim()
                    .parse()
                    .context("MAX_CONCURRENT_JOBS must be a positive number")?;
                if limit == 0 {
                    bail!("MAX_CONCURRENT_JOBS must be greater than zero");
                }
                Some(limit)
            }
            None => None,
        };

        let job_retention = var("JOB_RETENTION_SECS")
            .map(|raw| {
                raw.trim()
                    .parse::<u64>()
                    .map(Duration::from_secs)
                    .context("JOB_RETENTION_SECS must be a number of seconds")
            })
            .transpose()?;

        Ok(Self {
            host: var("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: var("PORT")
                .unwrap_or_else(|| "5000".to_string())
                .trim()
                .parse()
                .context("PORT must be a valid number")?,
            workflow_program: var("WORKFLOW_PROGRAM").unwrap_or_else(|| "python3".to_string()),
            workflow_args: var("WORKFLOW_ARGS")
                .unwrap_or_else(|| "main.py".to_string())
                .split_whitespace()
                .map(str::to_string)
                .collect(),
            workflow_dir: var("WORKFLOW_DIR").map(PathBuf::from),
            log_dir: var("LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("logs")),
            job_id_scheme: var("JOB_ID_SCHEME")
                .map(|raw| raw.parse::<JobIdScheme>())
                .transpose()
                .context("JOB_ID_SCHEME must be `timestamp` or `unique`")?
                .unwrap_or_default(),
            max_concurrent_jobs,
            job_retention,
        })
    }

    /// Socket address string to bind the HTTP server to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn dispatcher_config(&self) -> DispatcherConfig {
        DispatcherConfig {
            id_scheme: self.job_id_scheme,
            max_concurrent_jobs: self.max_concurrent_jobs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.workflow_program, "python3");
        assert_eq!(config.workflow_args, vec!["main.py"]);
        assert_eq!(config.log_dir, PathBuf::from("logs"));
        assert!(config.workflow_dir.is_none());
        assert_eq!(config.job_id_scheme, JobIdScheme::Timestamp);
        assert!(config.max_concurrent_jobs.is_none());
        assert!(config.job_retention.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("WORKFLOW_PROGRAM", "/usr/bin/env"),
            ("WORKFLOW_ARGS", "python3  -u main.py"),
            ("WORKFLOW_DIR", "/srv/scraper"),
            ("JOB_ID_SCHEME", "unique"),
            ("MAX_CONCURRENT_JOBS", "4"),
            ("JOB_RETENTION_SECS", "3600"),
        ])
        .unwrap();

        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
        assert_eq!(config.workflow_args, vec!["python3", "-u", "main.py"]);
        assert_eq!(config.workflow_dir, Some(PathBuf::from("/srv/scraper")));
        assert_eq!(config.job_id_scheme, JobIdScheme::Unique);
        assert_eq!(config.max_concurrent_jobs, Some(4));
        assert_eq!(config.job_retention, Some(Duration::from_secs(3600)));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "  "), ("MAX_CONCURRENT_JOBS", "")]).unwrap();
        assert_eq!(config.port, 5000);
        assert!(config.max_concurrent_jobs.is_none());
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(config_from(&[("PORT", "http")]).is_err());
        assert!(config_from(&[("MAX_CONCURRENT_JOBS", "0")]).is_err());
        assert!(config_from(&[("JOB_ID_SCHEME", "random")]).is_err());
        assert!(config_from(&[("JOB_RETENTION_SECS", "-5")]).is_err());
    }
}
