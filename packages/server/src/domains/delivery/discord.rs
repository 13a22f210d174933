//! Discord delivery via incoming webhooks (embed payloads).

use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::domains::alerts::models::Notification;
use crate::domains::jobs::Job;
use crate::kernel::traits::BaseChatWebhook;

/// Discord webhooks acknowledge delivery with 204 No Content.
const DISCORD_OK: u16 = 204;

const EMBED_SKY: u32 = 0x0ea5e9;
const EMBED_GOLD: u32 = 0xf59e0b;
const EMBED_PURPLE: u32 = 0x8b5cf6;

/// Embed payload for a job-bound alert. Golden leads switch to the gold
/// color and gain a description plus an urgency footer.
pub fn job_alert_embed(job: &Job, notification: &Notification, now: DateTime<Utc>) -> Value {
    let salary = job
        .salary_summary()
        .unwrap_or_else(|| "Not specified".to_string());
    let color = if notification.is_golden_lead {
        EMBED_GOLD
    } else {
        EMBED_SKY
    };

    let mut embed = json!({
        "title": notification.title,
        "url": job.source_url,
        "color": color,
        "fields": [
            { "name": "🏢 Company", "value": job.company_name, "inline": true },
            { "name": "💰 Salary", "value": salary, "inline": true },
            { "name": "💻 Tech stack", "value": job.stack_text(), "inline": false },
        ],
        "timestamp": now.to_rfc3339(),
    });

    if notification.is_golden_lead {
        embed["description"] =
            json!("🌟 **EXCEPTIONAL OPPORTUNITY** - this posting clears every golden-lead gate");
        if let Some(score) = notification.urgency_score {
            embed["footer"] = json!({ "text": format!("Urgency score: {score:.2}") });
        }
    }

    json!({ "embeds": [embed] })
}

/// Embed payload for a market signal.
pub fn market_signal_embed(notification: &Notification, now: DateTime<Utc>) -> Value {
    let company = notification.metadata_str("company_name").unwrap_or("N/A");
    let job_count = notification.metadata_i64("job_count").unwrap_or(0);

    json!({
        "embeds": [{
            "title": notification.title,
            "color": EMBED_PURPLE,
            "description": format!(
                "**{}** posted **{} openings** in the last 24 hours.",
                company, job_count
            ),
            "fields": [{
                "name": "What this can mean",
                "value": "• High hiring activity\n• Team expansion under way\n• A networking window",
                "inline": false,
            }],
            "timestamp": now.to_rfc3339(),
            "footer": { "text": "Market intelligence by JobRadar" },
        }],
    })
}

/// Renders and posts Discord notifications. Same bool contract as the
/// Slack renderer.
pub struct DiscordRenderer {
    webhook: Arc<dyn BaseChatWebhook>,
}

impl DiscordRenderer {
    pub fn new(webhook: Arc<dyn BaseChatWebhook>) -> Self {
        Self { webhook }
    }

    pub async fn send_job_alert(
        &self,
        webhook_url: &str,
        job: &Job,
        notification: &Notification,
    ) -> bool {
        let payload = job_alert_embed(job, notification, Utc::now());
        self.post(webhook_url, &payload, notification).await
    }

    pub async fn send_market_signal(&self, webhook_url: &str, notification: &Notification) -> bool {
        let payload = market_signal_embed(notification, Utc::now());
        self.post(webhook_url, &payload, notification).await
    }

    async fn post(&self, url: &str, payload: &Value, notification: &Notification) -> bool {
        match self.deliver(url, payload).await {
            Ok(()) => true,
            Err(e) => {
                error!(notification_id = %notification.id, "discord delivery failed: {e:#}");
                false
            }
        }
    }

    async fn deliver(&self, url: &str, payload: &Value) -> Result<()> {
        let status = self.webhook.post_json(url, payload).await?;
        if status != DISCORD_OK {
            bail!("discord webhook returned status {}", status);
        }
        Ok(())
    }
}
