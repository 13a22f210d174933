//! One dispatch cycle: drain the unsent backlog through the dispatcher.

use anyhow::Result;
use chrono::Utc;
use tracing::{error, info, warn};

use crate::domains::alerts::models::Notification;
use crate::domains::alerts::store::AlertStore;
use crate::domains::delivery::dispatcher::NotificationDispatcher;

/// Outcome counts of one dispatch cycle. Rows skipped for a missing or
/// deactivated user count in `attempted` but in neither `sent` nor
/// `failed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub attempted: usize,
    pub sent: usize,
    pub failed: usize,
}

enum DeliveryOutcome {
    Sent,
    Failed,
    Skipped,
}

/// Loads up to `limit` unsent rows (highest urgency first) and attempts
/// each one. A failed or errored row is left unsent for the next cycle;
/// one bad row never stops the rest of the batch.
pub async fn send_pending_notifications(
    store: &dyn AlertStore,
    dispatcher: &NotificationDispatcher,
    limit: i64,
) -> Result<DispatchSummary> {
    let pending = store.pending_notifications(limit).await?;
    info!(count = pending.len(), "dispatching pending notifications");

    let mut summary = DispatchSummary {
        attempted: pending.len(),
        ..Default::default()
    };

    for notification in &pending {
        match send_one(store, dispatcher, notification).await {
            Ok(DeliveryOutcome::Sent) => summary.sent += 1,
            Ok(DeliveryOutcome::Failed) => summary.failed += 1,
            Ok(DeliveryOutcome::Skipped) => {}
            Err(e) => {
                summary.failed += 1;
                error!(
                    notification_id = %notification.id,
                    "failed to process notification: {e:#}"
                );
            }
        }
    }

    info!(
        sent = summary.sent,
        failed = summary.failed,
        "dispatch cycle complete"
    );
    Ok(summary)
}

async fn send_one(
    store: &dyn AlertStore,
    dispatcher: &NotificationDispatcher,
    notification: &Notification,
) -> Result<DeliveryOutcome> {
    let Some(user) = store.user_by_id(notification.user_id).await? else {
        warn!(
            notification_id = %notification.id,
            user_id = %notification.user_id,
            "user missing, skipping notification"
        );
        return Ok(DeliveryOutcome::Skipped);
    };
    if !user.is_active {
        warn!(
            notification_id = %notification.id,
            user_id = %user.id,
            "user deactivated, skipping notification"
        );
        return Ok(DeliveryOutcome::Skipped);
    }

    let job = match notification.job_id {
        Some(id) => store.job_by_id(id).await?,
        None => None,
    };
    let config = store.first_active_config(user.id).await?;

    if !dispatcher
        .dispatch(notification, &user, job.as_ref(), config.as_ref())
        .await
    {
        return Ok(DeliveryOutcome::Failed);
    }

    store
        .mark_notification_sent(notification.id, Utc::now())
        .await?;
    Ok(DeliveryOutcome::Sent)
}
