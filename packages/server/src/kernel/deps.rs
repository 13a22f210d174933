//! Server dependencies (using traits for testability)
//!
//! Central dependency container handed to the task orchestrator and the
//! delivery layer. Every external service sits behind a trait so tests
//! can swap in recording fakes.

use anyhow::Result;
use sqlx::PgPool;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::Config;
use crate::domains::alerts::store::{AlertStore, PgAlertStore};
use crate::kernel::chat_webhook::ReqwestChatWebhook;
use crate::kernel::pipeline_clients::{
    HttpJobEnricher, HttpJobIngestor, NoopJobEnricher, NoopJobIngestor,
};
use crate::kernel::sendgrid_client::{NoopEmailSender, SendGridMailer};
use crate::kernel::traits::{BaseChatWebhook, BaseEmailSender, BaseJobEnricher, BaseJobIngestor};

/// Server dependencies accessible to scheduled tasks and dispatch
#[derive(Clone)]
pub struct ServerDeps {
    pub store: Arc<dyn AlertStore>,
    pub email: Arc<dyn BaseEmailSender>,
    pub chat: Arc<dyn BaseChatWebhook>,
    pub ingestor: Arc<dyn BaseJobIngestor>,
    pub enricher: Arc<dyn BaseJobEnricher>,
    /// Optional directory of HTML email templates; built-in templates
    /// are used when unset.
    pub email_template_dir: Option<PathBuf>,
}

impl ServerDeps {
    /// Create new ServerDeps with the given dependencies
    pub fn new(
        store: Arc<dyn AlertStore>,
        email: Arc<dyn BaseEmailSender>,
        chat: Arc<dyn BaseChatWebhook>,
        ingestor: Arc<dyn BaseJobIngestor>,
        enricher: Arc<dyn BaseJobEnricher>,
        email_template_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            store,
            email,
            chat,
            ingestor,
            enricher,
            email_template_dir,
        }
    }

    /// Wire up production dependencies from configuration. Optional
    /// credentials degrade to no-op implementations instead of failing
    /// boot, so a partially configured environment still schedules.
    pub fn production(pool: PgPool, config: &Config) -> Result<Self> {
        let email: Arc<dyn BaseEmailSender> = match &config.sendgrid_api_key {
            Some(api_key) => Arc::new(SendGridMailer::new(
                api_key.clone(),
                config.email_from.clone(),
                config.email_from_name.clone(),
            )?),
            None => Arc::new(NoopEmailSender),
        };

        let ingestor: Arc<dyn BaseJobIngestor> = match &config.ingest_service_url {
            Some(url) => Arc::new(HttpJobIngestor::new(url.clone())?),
            None => Arc::new(NoopJobIngestor),
        };

        let enricher: Arc<dyn BaseJobEnricher> = match &config.enrich_service_url {
            Some(url) => Arc::new(HttpJobEnricher::new(url.clone())?),
            None => Arc::new(NoopJobEnricher),
        };

        Ok(Self::new(
            Arc::new(PgAlertStore::new(pool)),
            email,
            Arc::new(ReqwestChatWebhook::new()?),
            ingestor,
            enricher,
            config.email_template_dir.clone(),
        ))
    }
}
