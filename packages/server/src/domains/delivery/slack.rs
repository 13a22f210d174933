//! Slack delivery via incoming webhooks (Block Kit payloads).

use anyhow::{bail, Result};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::error;

use crate::domains::alerts::models::{Notification, NotificationKind};
use crate::domains::jobs::Job;
use crate::kernel::traits::BaseChatWebhook;

/// Slack webhooks acknowledge delivery with a plain 200.
const SLACK_OK: u16 = 200;

fn alert_emoji(notification: &Notification) -> &'static str {
    if notification.is_golden_lead {
        "🌟"
    } else if notification.kind == NotificationKind::MarketSignal {
        "🚀"
    } else {
        "💼"
    }
}

/// Block Kit payload for a job-bound alert. Golden leads get an extra
/// callout section under the header.
pub fn job_alert_blocks(job: &Job, notification: &Notification) -> Value {
    let salary = job
        .salary_summary()
        .unwrap_or_else(|| "Not specified".to_string());

    let mut blocks = vec![
        json!({
            "type": "header",
            "text": {
                "type": "plain_text",
                "text": format!("{} {}", alert_emoji(notification), notification.title),
            },
        }),
        json!({
            "type": "section",
            "fields": [
                { "type": "mrkdwn", "text": format!("*Company:*\n{}", job.company_name) },
                { "type": "mrkdwn", "text": format!("*Salary:*\n{}", salary) },
                { "type": "mrkdwn", "text": format!("*Tech stack:*\n{}", job.stack_text()) },
            ],
        }),
    ];

    if notification.is_golden_lead {
        blocks.insert(
            1,
            json!({
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": ":star2: *EXCEPTIONAL OPPORTUNITY* - this posting clears every golden-lead gate",
                },
            }),
        );
    }

    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": { "type": "plain_text", "text": "View full posting" },
            "url": job.source_url,
            "style": "primary",
        }],
    }));

    json!({ "blocks": blocks })
}

/// Block Kit payload for a market signal.
pub fn market_signal_blocks(notification: &Notification) -> Value {
    let company = notification.metadata_str("company_name").unwrap_or("N/A");
    let job_count = notification.metadata_i64("job_count").unwrap_or(0);

    json!({
        "blocks": [
            {
                "type": "header",
                "text": {
                    "type": "plain_text",
                    "text": format!("🚀 {}", notification.title),
                },
            },
            {
                "type": "section",
                "text": {
                    "type": "mrkdwn",
                    "text": format!(
                        "*{}* posted *{} openings* in the last 24 hours.\n\nThis can indicate:\n• High hiring activity\n• Team expansion under way\n• A networking window",
                        company, job_count
                    ),
                },
            },
        ],
    })
}

/// Renders and posts Slack notifications. Returns delivery success as a
/// bool; failures are logged here and never bubble past this boundary.
pub struct SlackRenderer {
    webhook: Arc<dyn BaseChatWebhook>,
}

impl SlackRenderer {
    pub fn new(webhook: Arc<dyn BaseChatWebhook>) -> Self {
        Self { webhook }
    }

    pub async fn send_job_alert(
        &self,
        webhook_url: &str,
        job: &Job,
        notification: &Notification,
    ) -> bool {
        let payload = job_alert_blocks(job, notification);
        self.post(webhook_url, &payload, notification).await
    }

    pub async fn send_market_signal(&self, webhook_url: &str, notification: &Notification) -> bool {
        let payload = market_signal_blocks(notification);
        self.post(webhook_url, &payload, notification).await
    }

    async fn post(&self, url: &str, payload: &Value, notification: &Notification) -> bool {
        match self.deliver(url, payload).await {
            Ok(()) => true,
            Err(e) => {
                error!(notification_id = %notification.id, "slack delivery failed: {e:#}");
                false
            }
        }
    }

    async fn deliver(&self, url: &str, payload: &Value) -> Result<()> {
        let status = self.webhook.post_json(url, payload).await?;
        if status != SLACK_OK {
            bail!("slack webhook returned status {}", status);
        }
        Ok(())
    }
}
