use std::time::Duration;

use anyhow::{bail, Context, Result};

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Active assignments that count as a 100% workload.
    pub workload_capacity: f64,
    pub extraction_timeout: Duration,
    /// Optional JSON file replacing the built-in skill taxonomy.
    pub skill_taxonomy_path: Option<String>,
    pub match_default_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let workload_capacity: f64 = optional_env("WORKLOAD_CAPACITY", "5")
            .parse()
            .context("WORKLOAD_CAPACITY must be a number")?;
        if !(workload_capacity.is_finite() && workload_capacity > 0.0) {
            bail!("WORKLOAD_CAPACITY must be greater than zero, got {workload_capacity}");
        }

        let timeout_ms: u64 = optional_env("EXTRACTION_TIMEOUT_MS", "5000")
            .parse()
            .context("EXTRACTION_TIMEOUT_MS must be a whole number of milliseconds")?;
        if timeout_ms == 0 {
            bail!("EXTRACTION_TIMEOUT_MS must be greater than zero");
        }

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
            workload_capacity,
            extraction_timeout: Duration::from_millis(timeout_ms),
            skill_taxonomy_path: std::env::var("SKILL_TAXONOMY_PATH").ok(),
            match_default_limit: optional_env("MATCH_DEFAULT_LIMIT", "10")
                .parse::<usize>()
                .context("MATCH_DEFAULT_LIMIT must be a whole number")?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
