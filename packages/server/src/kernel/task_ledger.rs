//! Persistent record of scheduled-task activity.
//!
//! One `task_runs` row per task, upserted on every run. The orchestrator
//! reads it at startup to detect runs missed while the process was down.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

/// The six scheduled tasks, in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_name", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskName {
    Ingest,
    Enrich,
    AlertCheck,
    Dispatch,
    Cleanup,
    Report,
}

impl TaskName {
    /// Declaration order; also the order the startup catch-up pass uses,
    /// so upstream tasks run before the ones consuming their output.
    pub const ALL: [TaskName; 6] = [
        TaskName::Ingest,
        TaskName::Enrich,
        TaskName::AlertCheck,
        TaskName::Dispatch,
        TaskName::Cleanup,
        TaskName::Report,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskName::Ingest => "ingest",
            TaskName::Enrich => "enrich",
            TaskName::AlertCheck => "alert_check",
            TaskName::Dispatch => "dispatch",
            TaskName::Cleanup => "cleanup",
            TaskName::Report => "report",
        }
    }

    /// Cron schedule (seconds-resolution, UTC). Enrichment trails
    /// ingestion by 15 minutes so fresh postings get enriched in the
    /// same six-hour cycle.
    pub fn cron(&self) -> &'static str {
        match self {
            TaskName::Ingest => "0 0 */6 * * *",
            TaskName::Enrich => "0 15 */6 * * *",
            TaskName::AlertCheck => "0 0 * * * *",
            TaskName::Dispatch => "0 */15 * * * *",
            TaskName::Cleanup => "0 0 3 * * *",
            TaskName::Report => "0 0 9 * * *",
        }
    }

    /// Nominal gap between firings, used to decide whether a run was
    /// missed while the process was down.
    pub fn cadence(&self) -> Duration {
        match self {
            TaskName::Ingest => Duration::hours(6),
            TaskName::Enrich => Duration::hours(6),
            TaskName::AlertCheck => Duration::hours(1),
            TaskName::Dispatch => Duration::minutes(15),
            TaskName::Cleanup => Duration::hours(24),
            TaskName::Report => Duration::hours(24),
        }
    }
}

impl fmt::Display for TaskName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ledger row for one scheduled task.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TaskRun {
    pub task: TaskName,
    pub last_started_at: Option<DateTime<Utc>>,
    pub last_succeeded_at: Option<DateTime<Utc>>,
    /// Rendered error of the most recent run; NULL after a success.
    pub last_error: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl TaskRun {
    pub async fn find(task: TaskName, pool: &PgPool) -> Result<Option<Self>> {
        let run = sqlx::query_as::<_, TaskRun>("SELECT * FROM task_runs WHERE task = $1")
            .bind(task)
            .fetch_optional(pool)
            .await?;

        Ok(run)
    }

    pub async fn record_started(task: TaskName, at: DateTime<Utc>, pool: &PgPool) -> Result<()> {
        sqlx::query(
            "INSERT INTO task_runs (task, last_started_at, updated_at)
             VALUES ($1, $2, now())
             ON CONFLICT (task) DO UPDATE
                 SET last_started_at = $2, updated_at = now()",
        )
        .bind(task)
        .bind(at)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Records the outcome of a run. On success the error column is
    /// cleared; on failure the previous success timestamp is kept.
    pub async fn record_finished(
        task: TaskName,
        error: Option<&str>,
        at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<()> {
        let succeeded_at = if error.is_none() { Some(at) } else { None };

        sqlx::query(
            "INSERT INTO task_runs (task, last_succeeded_at, last_error, updated_at)
             VALUES ($1, $2, $3, now())
             ON CONFLICT (task) DO UPDATE
                 SET last_succeeded_at = COALESCE($2, task_runs.last_succeeded_at),
                     last_error = $3,
                     updated_at = now()",
        )
        .bind(task)
        .bind(succeeded_at)
        .bind(error)
        .execute(pool)
        .await?;

        Ok(())
    }
}
