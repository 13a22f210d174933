//! Email delivery: picks a template, fills it, and hands the HTML to
//! the configured [`BaseEmailSender`].

use std::sync::Arc;
use tracing::error;

use crate::domains::alerts::models::Notification;
use crate::domains::delivery::templates::{self, TemplateStore};
use crate::domains::jobs::Job;
use crate::kernel::traits::BaseEmailSender;

/// Renders and sends email notifications. Returns delivery success as a
/// bool; failures are logged here and never bubble past this boundary.
pub struct EmailRenderer {
    sender: Arc<dyn BaseEmailSender>,
    templates: TemplateStore,
}

impl EmailRenderer {
    pub fn new(sender: Arc<dyn BaseEmailSender>, templates: TemplateStore) -> Self {
        Self { sender, templates }
    }

    pub async fn send_job_alert(
        &self,
        to: &str,
        user_name: &str,
        job: &Job,
        notification: &Notification,
    ) -> bool {
        let vars = [
            ("user_name", user_name.to_string()),
            ("job_title", job.title.clone()),
            ("company_name", job.company_name.clone()),
            (
                "salary",
                job.salary_summary()
                    .unwrap_or_else(|| "Not specified".to_string()),
            ),
            ("tech_stack", job.stack_text().to_string()),
            ("source_url", job.source_url.clone()),
            (
                "golden_banner",
                if notification.is_golden_lead {
                    templates::golden_banner_html().to_string()
                } else {
                    String::new()
                },
            ),
        ];

        let html = match self.templates.render("job_alert", &vars).await {
            Some(html) => html,
            None => templates::job_alert_html(user_name, job, notification),
        };

        self.send(to, notification, &html).await
    }

    pub async fn send_market_signal(
        &self,
        to: &str,
        user_name: &str,
        notification: &Notification,
    ) -> bool {
        let vars = [
            ("user_name", user_name.to_string()),
            ("title", notification.title.clone()),
            (
                "company_name",
                notification
                    .metadata_str("company_name")
                    .unwrap_or("N/A")
                    .to_string(),
            ),
            (
                "job_count",
                notification.metadata_i64("job_count").unwrap_or(0).to_string(),
            ),
        ];

        let html = match self.templates.render("market_signal", &vars).await {
            Some(html) => html,
            None => templates::market_signal_html(user_name, notification),
        };

        self.send(to, notification, &html).await
    }

    async fn send(&self, to: &str, notification: &Notification, html: &str) -> bool {
        match self.sender.send(to, &notification.title, html).await {
            Ok(()) => true,
            Err(e) => {
                error!(notification_id = %notification.id, "email delivery failed: {e:#}");
                false
            }
        }
    }
}
