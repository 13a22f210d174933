//! Integration tests for notification dispatch.
//!
//! Runs dispatch cycles against the in-memory store:
//! - delivery preconditions (webhook URLs, job rows, active users)
//! - urgency-first ordering and the batch cap
//! - per-row failure isolation and retry semantics
//! - channel-specific acknowledgement codes

use chrono::Utc;
use radar_core::common::{JobId, NotificationId};
use radar_core::domains::accounts::User;
use radar_core::domains::alerts::{
    Notification, NotificationChannel, NotificationKind,
};
use radar_core::domains::delivery::{send_pending_notifications, NotificationDispatcher};
use radar_core::kernel::test_dependencies::{fixtures, MockChatWebhook, MockEmailSender};
use radar_core::kernel::TestDependencies;
use serde_json::json;

// =============================================================================
// Test Helpers
// =============================================================================

fn dispatcher_for(deps: &TestDependencies) -> NotificationDispatcher {
    NotificationDispatcher::new(deps.email.clone(), deps.chat.clone(), None)
}

/// A pending email job-match row, built directly so tests control the
/// urgency score and job linkage.
fn job_match_row(
    user: &User,
    job_id: Option<JobId>,
    title: &str,
    urgency_score: Option<f64>,
) -> Notification {
    Notification {
        id: NotificationId::new(),
        user_id: user.id,
        job_id,
        kind: NotificationKind::JobMatch,
        channel: NotificationChannel::Email,
        title: title.to_string(),
        body: format!("Details for {title}"),
        is_golden_lead: false,
        urgency_score,
        metadata: json!({}),
        is_sent: false,
        sent_at: None,
        created_at: Utc::now(),
    }
}

// =============================================================================
// Delivery preconditions
// =============================================================================

#[tokio::test]
async fn missing_slack_webhook_skips_delivery_without_posting() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.channels = vec![NotificationChannel::Slack];
    config.slack_webhook_url = None;
    store.seed_user(user.clone());
    store.seed_config(config);

    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());
    let mut row = job_match_row(&user, Some(job.id), "Rust Engineer", None);
    row.channel = NotificationChannel::Slack;
    store.seed_notification(row);

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");

    // The row goes through Slack routing, which has nowhere to post.
    let mut rows = store.notifications();
    assert_eq!(rows.len(), 1);
    let row = rows.remove(0);
    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 1);
    assert!(!row.is_sent);
    assert_eq!(deps.chat.post_count(), 0);
}

#[tokio::test]
async fn job_bound_row_without_job_fails_delivery() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    store.seed_user(user.clone());
    store.seed_config(fixtures::config(&user));

    // Points at a job the store never saw.
    store.seed_notification(job_match_row(&user, Some(JobId::new()), "Ghost Job", None));

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 1);
    assert_eq!(deps.email.sent_count(), 0);
    assert!(!store.notifications()[0].is_sent);
}

#[tokio::test]
async fn deactivated_user_rows_are_skipped_not_failed() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let mut user = fixtures::candidate("gone@example.com");
    user.is_active = false;
    store.seed_user(user.clone());

    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());
    store.seed_notification(job_match_row(&user, Some(job.id), "Rust Engineer", None));

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.sent, 0);
    assert_eq!(summary.failed, 0);
    assert_eq!(deps.email.sent_count(), 0);
    assert!(!store.notifications()[0].is_sent);
}

// =============================================================================
// Ordering and batching
// =============================================================================

#[tokio::test]
async fn urgent_rows_dispatch_first_and_limit_caps_the_batch() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    store.seed_user(user.clone());
    store.seed_config(fixtures::config(&user));
    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());

    store.seed_notification(job_match_row(&user, Some(job.id), "Unscored", None));
    store.seed_notification(job_match_row(&user, Some(job.id), "Mild", Some(0.6)));
    store.seed_notification(job_match_row(&user, Some(job.id), "Hot", Some(0.9)));

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 2)
        .await
        .expect("dispatch cycle failed");

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.sent, 2);

    // Highest urgency went out first; the unscored row waits its turn.
    let subjects: Vec<String> = deps.email.sent().iter().map(|e| e.subject.clone()).collect();
    assert_eq!(subjects, vec!["Hot".to_string(), "Mild".to_string()]);

    let pending: Vec<Notification> = store
        .notifications()
        .into_iter()
        .filter(|n| !n.is_sent)
        .collect();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].title, "Unscored");
}

// =============================================================================
// Failure isolation
// =============================================================================

#[tokio::test]
async fn failing_email_does_not_block_slack_delivery_of_same_alert() {
    let deps = TestDependencies::new().mock_email(MockEmailSender::failing());
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.channels = vec![NotificationChannel::Email, NotificationChannel::Slack];
    config.slack_webhook_url =
        Some("https://hooks.slack.com/services/T000/B000/XXXX".to_string());
    store.seed_user(user.clone());
    store.seed_config(config);

    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());

    let mut email_row = job_match_row(&user, Some(job.id), "Rust Engineer", None);
    email_row.channel = NotificationChannel::Email;
    let mut slack_row = job_match_row(&user, Some(job.id), "Rust Engineer", None);
    slack_row.channel = NotificationChannel::Slack;
    store.seed_notification(email_row);
    store.seed_notification(slack_row);

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");

    assert_eq!(summary.attempted, 2);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(deps.chat.post_count(), 1);

    for row in store.notifications() {
        match row.channel {
            NotificationChannel::Email => assert!(!row.is_sent, "failed email row must stay pending"),
            NotificationChannel::Slack => assert!(row.is_sent),
            NotificationChannel::Discord => unreachable!(),
        }
    }
}

// =============================================================================
// Channel acknowledgement codes
// =============================================================================

#[tokio::test]
async fn discord_delivery_requires_a_204_ack() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.channels = vec![NotificationChannel::Discord];
    config.discord_webhook_url =
        Some("https://discord.com/api/webhooks/1234/abcd".to_string());
    store.seed_user(user.clone());
    store.seed_config(config);

    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());
    let mut row = job_match_row(&user, Some(job.id), "Rust Engineer", None);
    row.channel = NotificationChannel::Discord;
    store.seed_notification(row);

    // Webhook answers 200; Discord treats anything but 204 as a failure.
    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");
    assert_eq!(summary.failed, 1);
    assert!(!store.notifications()[0].is_sent);

    deps.chat.set_status(204);
    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");
    assert_eq!(summary.sent, 1);
    assert!(store.notifications()[0].is_sent);
    assert_eq!(deps.chat.post_count(), 2);
}

#[tokio::test]
async fn slack_payload_posts_blocks_to_configured_webhook() {
    let deps = TestDependencies::new().mock_chat(MockChatWebhook::new().with_status(200));
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.channels = vec![NotificationChannel::Slack];
    config.slack_webhook_url =
        Some("https://hooks.slack.com/services/T000/B000/XXXX".to_string());
    store.seed_user(user.clone());
    store.seed_config(config);

    let job = fixtures::job("Rust Engineer", "Globex");
    store.seed_job(job.clone());
    let mut row = job_match_row(&user, Some(job.id), "Rust Engineer", None);
    row.channel = NotificationChannel::Slack;
    store.seed_notification(row);

    let summary = send_pending_notifications(store.as_ref(), &dispatcher_for(&deps), 100)
        .await
        .expect("dispatch cycle failed");
    assert_eq!(summary.sent, 1);

    let posts = deps.chat.posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].0, "https://hooks.slack.com/services/T000/B000/XXXX");
    assert!(posts[0].1["blocks"].is_array());
}
