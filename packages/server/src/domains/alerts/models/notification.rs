use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use crate::common::{JobId, NotificationId, UserId};

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A posting matched a candidate's alert config.
    JobMatch,
    /// A posting matched a recruiter's alert config.
    HrMatch,
    /// A company crossed the hiring-surge threshold.
    MarketSignal,
    /// A posting cleared every golden-lead gate.
    GoldenLead,
}

impl NotificationKind {
    /// Whether dispatch needs the underlying job row to render this kind.
    pub fn requires_job(&self) -> bool {
        !matches!(self, NotificationKind::MarketSignal)
    }
}

/// Delivery transport for a notification row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    Email,
    Slack,
    Discord,
}

/// A queued alert delivery. One row per (alert, channel); the dispatch
/// task drains unsent rows and flips `is_sent` on success.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub job_id: Option<JobId>,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub is_golden_lead: bool,
    /// Only set on golden leads; drives dispatch ordering.
    pub urgency_score: Option<f64>,
    pub metadata: serde_json::Value,
    pub is_sent: bool,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for inserting a notification row.
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub user_id: UserId,
    pub job_id: Option<JobId>,
    pub kind: NotificationKind,
    pub channel: NotificationChannel,
    pub title: String,
    pub body: String,
    pub is_golden_lead: bool,
    pub urgency_score: Option<f64>,
    pub metadata: serde_json::Value,
}

impl Notification {
    pub async fn create(new: NewNotification, pool: &PgPool) -> Result<Self> {
        let notification = sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications
                 (id, user_id, job_id, kind, channel, title, body,
                  is_golden_lead, urgency_score, metadata)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
             RETURNING *",
        )
        .bind(NotificationId::new())
        .bind(new.user_id)
        .bind(new.job_id)
        .bind(new.kind)
        .bind(new.channel)
        .bind(new.title)
        .bind(new.body)
        .bind(new.is_golden_lead)
        .bind(new.urgency_score)
        .bind(new.metadata)
        .fetch_one(pool)
        .await?;

        Ok(notification)
    }

    /// Whether any row (on any channel) already covers this
    /// (user, job, kind) combination. The duplicate-suppression key for
    /// job-bound alerts.
    pub async fn exists_for_job(
        user_id: UserId,
        job_id: JobId,
        kind: NotificationKind,
        pool: &PgPool,
    ) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                 SELECT 1 FROM notifications
                 WHERE user_id = $1 AND job_id = $2 AND kind = $3
             )",
        )
        .bind(user_id)
        .bind(job_id)
        .bind(kind)
        .fetch_one(pool)
        .await?;

        Ok(exists.0)
    }

    /// Whether the user already got a market signal for this company
    /// since `since` (in practice, the start of the current day).
    pub async fn market_signal_exists(
        user_id: UserId,
        company_name: &str,
        since: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<bool> {
        let exists: (bool,) = sqlx::query_as(
            "SELECT EXISTS(
                 SELECT 1 FROM notifications
                 WHERE user_id = $1
                   AND kind = 'market_signal'
                   AND created_at >= $2
                   AND metadata->>'company_name' = $3
             )",
        )
        .bind(user_id)
        .bind(since)
        .bind(company_name)
        .fetch_one(pool)
        .await?;

        Ok(exists.0)
    }

    /// Unsent rows, highest urgency first. Rows without an urgency score
    /// sort after scored ones; creation order breaks ties.
    pub async fn find_pending(limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        let notifications = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications
             WHERE is_sent = FALSE
             ORDER BY urgency_score DESC NULLS LAST, created_at ASC
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(notifications)
    }

    pub async fn mark_sent(id: NotificationId, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_sent = TRUE, sent_at = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(pool)
            .await?;

        Ok(())
    }

    /// Deletes delivered rows older than `cutoff`, returning the number
    /// removed. Undelivered rows are kept regardless of age.
    pub async fn delete_sent_before(cutoff: DateTime<Utc>, pool: &PgPool) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE is_sent = TRUE AND sent_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn count_sent_since(since: DateTime<Utc>, pool: &PgPool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications WHERE is_sent = TRUE AND sent_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    pub async fn count_golden_leads_since(since: DateTime<Utc>, pool: &PgPool) -> Result<i64> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM notifications
             WHERE is_golden_lead = TRUE AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(count.0)
    }

    /// JSON metadata accessor for string fields set by the alert engine.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key)?.as_str()
    }

    /// JSON metadata accessor for integer fields set by the alert engine.
    pub fn metadata_i64(&self, key: &str) -> Option<i64> {
        self.metadata.get(key)?.as_i64()
    }
}
