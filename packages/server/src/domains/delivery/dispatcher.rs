//! Channel routing for queued notifications.
//!
//! The dispatcher checks preconditions (webhook configured, job row
//! still present), picks the renderer for the row's channel, and
//! reports plain success or failure. Failed rows stay unsent and are
//! retried by later dispatch cycles.

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, warn};

use crate::domains::accounts::{AlertConfig, User};
use crate::domains::alerts::models::{Notification, NotificationChannel, NotificationKind};
use crate::domains::delivery::discord::DiscordRenderer;
use crate::domains::delivery::email::EmailRenderer;
use crate::domains::delivery::slack::SlackRenderer;
use crate::domains::delivery::templates::TemplateStore;
use crate::domains::jobs::Job;
use crate::kernel::traits::{BaseChatWebhook, BaseEmailSender};

/// Precondition failures caught before any renderer runs.
#[derive(Debug, thiserror::Error)]
enum DispatchError {
    #[error("{kind:?} notification requires a job record")]
    MissingJob { kind: NotificationKind },
    #[error("no {channel:?} webhook configured for this user")]
    MissingWebhook { channel: NotificationChannel },
}

/// Routes one notification row to the right channel renderer.
pub struct NotificationDispatcher {
    email: EmailRenderer,
    slack: SlackRenderer,
    discord: DiscordRenderer,
}

impl NotificationDispatcher {
    pub fn new(
        email_sender: Arc<dyn BaseEmailSender>,
        chat_webhook: Arc<dyn BaseChatWebhook>,
        template_dir: Option<PathBuf>,
    ) -> Self {
        Self {
            email: EmailRenderer::new(email_sender, TemplateStore::new(template_dir)),
            slack: SlackRenderer::new(chat_webhook.clone()),
            discord: DiscordRenderer::new(chat_webhook),
        }
    }

    /// Attempts delivery of one row. `job` is the posting the row points
    /// at (if any) and `config` the user's first active config, which
    /// supplies webhook URLs for the chat channels.
    ///
    /// Never panics or errors out: every failure path logs and returns
    /// `false` so one bad row cannot take down a dispatch cycle.
    pub async fn dispatch(
        &self,
        notification: &Notification,
        user: &User,
        job: Option<&Job>,
        config: Option<&AlertConfig>,
    ) -> bool {
        match self.route(notification, user, job, config).await {
            Ok(delivered) => delivered,
            Err(e @ DispatchError::MissingWebhook { .. }) => {
                warn!(
                    notification_id = %notification.id,
                    user_id = %user.id,
                    "skipping delivery: {e}"
                );
                false
            }
            Err(e @ DispatchError::MissingJob { .. }) => {
                error!(notification_id = %notification.id, "cannot render: {e}");
                false
            }
        }
    }

    async fn route(
        &self,
        notification: &Notification,
        user: &User,
        job: Option<&Job>,
        config: Option<&AlertConfig>,
    ) -> Result<bool, DispatchError> {
        let name = user.display_name();

        match notification.channel {
            NotificationChannel::Email => {
                if notification.kind.requires_job() {
                    let job = require_job(notification, job)?;
                    Ok(self
                        .email
                        .send_job_alert(&user.email, name, job, notification)
                        .await)
                } else {
                    Ok(self
                        .email
                        .send_market_signal(&user.email, name, notification)
                        .await)
                }
            }
            NotificationChannel::Slack => {
                let url = config
                    .and_then(|c| c.slack_webhook_url.as_deref())
                    .ok_or(DispatchError::MissingWebhook {
                        channel: NotificationChannel::Slack,
                    })?;
                if notification.kind.requires_job() {
                    let job = require_job(notification, job)?;
                    Ok(self.slack.send_job_alert(url, job, notification).await)
                } else {
                    Ok(self.slack.send_market_signal(url, notification).await)
                }
            }
            NotificationChannel::Discord => {
                let url = config
                    .and_then(|c| c.discord_webhook_url.as_deref())
                    .ok_or(DispatchError::MissingWebhook {
                        channel: NotificationChannel::Discord,
                    })?;
                if notification.kind.requires_job() {
                    let job = require_job(notification, job)?;
                    Ok(self.discord.send_job_alert(url, job, notification).await)
                } else {
                    Ok(self.discord.send_market_signal(url, notification).await)
                }
            }
        }
    }
}

fn require_job<'a>(
    notification: &Notification,
    job: Option<&'a Job>,
) -> Result<&'a Job, DispatchError> {
    job.ok_or(DispatchError::MissingJob {
        kind: notification.kind,
    })
}
