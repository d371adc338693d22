use anyhow::{Context, Result};

use crate::models::template::DEFAULT_MAX_VERSIONS;

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub port: u16,
    pub rust_log: String,
    /// Snapshots kept per template unless the template sets its own cap.
    pub template_max_versions: usize,
    /// Validity window applied when an offer is sent and the company sets none.
    pub offer_validity_days: i64,
    pub dispatch_queue: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            template_max_versions: optional_env("TEMPLATE_MAX_VERSIONS", DEFAULT_MAX_VERSIONS)?,
            offer_validity_days: optional_env("OFFER_VALIDITY_DAYS", 30)?,
            dispatch_queue: std::env::var("DISPATCH_QUEUE")
                .unwrap_or_else(|_| "offer_dispatch_jobs".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Fixed configuration for service tests; no environment access.
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/offers_test".to_string(),
            redis_url: "redis://localhost".to_string(),
            s3_bucket: "offers-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            port: 0,
            rust_log: "debug".to_string(),
            template_max_versions: DEFAULT_MAX_VERSIONS,
            offer_validity_days: 30,
            dispatch_queue: "offer_dispatch_jobs".to_string(),
        }
    }
}
