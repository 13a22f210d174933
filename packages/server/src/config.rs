use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::path::PathBuf;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// SendGrid credential; when absent, email delivery is disabled and
    /// email notifications fail at dispatch time instead of at boot.
    pub sendgrid_api_key: Option<String>,
    pub email_from: String,
    pub email_from_name: String,
    /// Optional directory of HTML email templates. Missing or unreadable
    /// templates fall back to the built-in ones.
    pub email_template_dir: Option<PathBuf>,
    /// Endpoint of the job collection service, hit on the ingest schedule.
    pub ingest_service_url: Option<String>,
    /// Endpoint of the enrichment service, hit on the enrich schedule.
    pub enrich_service_url: Option<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .context("DATABASE_URL must be set")?,
            sendgrid_api_key: env::var("SENDGRID_API_KEY").ok(),
            email_from: env::var("SENDGRID_FROM_EMAIL")
                .unwrap_or_else(|_| "noreply@jobradar.app".to_string()),
            email_from_name: env::var("SENDGRID_FROM_NAME")
                .unwrap_or_else(|_| "JobRadar".to_string()),
            email_template_dir: env::var("EMAIL_TEMPLATE_DIR").ok().map(PathBuf::from),
            ingest_service_url: env::var("INGEST_SERVICE_URL").ok(),
            enrich_service_url: env::var("ENRICH_SERVICE_URL").ok(),
        })
    }
}
