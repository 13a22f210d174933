// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Business logic (matching, scoring, dispatch rules) lives in domain
// functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseEmailSender)

use anyhow::Result;
use async_trait::async_trait;

// =============================================================================
// Email Trait (Infrastructure - transactional email)
// =============================================================================

#[async_trait]
pub trait BaseEmailSender: Send + Sync {
    /// Send one HTML email. An error means the message was not accepted
    /// by the provider; the caller decides whether to log or retry.
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()>;
}

// =============================================================================
// Chat Webhook Trait (Infrastructure - Slack/Discord incoming webhooks)
// =============================================================================

#[async_trait]
pub trait BaseChatWebhook: Send + Sync {
    /// POST a JSON payload to a webhook URL and return the HTTP status.
    /// Transport failures (timeouts, DNS) are errors; any received
    /// response is an Ok status code for the caller to interpret,
    /// since Slack and Discord signal success differently.
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<u16>;
}

// =============================================================================
// Pipeline Collaborator Traits (Infrastructure - scraping/enrichment)
// =============================================================================

#[async_trait]
pub trait BaseJobIngestor: Send + Sync {
    /// Kick off a collection cycle on the scraping service and return
    /// the number of postings it reports having found.
    async fn run_collection(&self) -> Result<i64>;
}

#[async_trait]
pub trait BaseJobEnricher: Send + Sync {
    /// Ask the enrichment service to process unenriched postings and
    /// return how many it handled.
    async fn enrich_pending(&self) -> Result<i64>;
}
