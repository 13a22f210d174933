//! Persistence seam for the alert pipeline.
//!
//! Everything the engine, dispatcher, and scheduled tasks touch goes
//! through [`AlertStore`], so the pipeline runs unchanged against
//! Postgres in production and the in-memory store in tests.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;

use crate::common::{CompanyId, JobId, NotificationId, UserId};
use crate::domains::accounts::{AlertConfig, User, UserRole};
use crate::domains::alerts::models::{NewNotification, Notification, NotificationKind};
use crate::domains::jobs::{Company, HiringSurge, Job};
use crate::kernel::task_ledger::{TaskName, TaskRun};

/// Storage operations used by the alert pipeline.
///
/// Job, company, user, and config reads are one side; notification and
/// task-ledger writes are the other. The pipeline never writes to the
/// job catalog or to accounts.
#[async_trait]
pub trait AlertStore: Send + Sync {
    // --- job catalog (read-only) ---

    async fn jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>>;

    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>>;

    async fn count_jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<i64>;

    async fn hiring_surges_since(
        &self,
        cutoff: DateTime<Utc>,
        min_postings: i64,
    ) -> Result<Vec<HiringSurge>>;

    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>>;

    // --- accounts (read-only) ---

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>>;

    /// Active configs of active users with the given role, paired with
    /// their owners. Ordered per user, oldest config first.
    async fn active_configs_for_role(&self, role: UserRole)
        -> Result<Vec<(AlertConfig, User)>>;

    /// Active configs of all active users, paired with their owners.
    async fn active_configs_with_users(&self) -> Result<Vec<(AlertConfig, User)>>;

    /// Active recruiters with market signals enabled somewhere.
    async fn market_signal_recipients(&self) -> Result<Vec<User>>;

    async fn first_active_config(&self, user_id: UserId) -> Result<Option<AlertConfig>>;

    async fn count_active_users(&self) -> Result<i64>;

    // --- notification outbox ---

    async fn notification_exists(
        &self,
        user_id: UserId,
        job_id: JobId,
        kind: NotificationKind,
    ) -> Result<bool>;

    async fn market_signal_exists_since(
        &self,
        user_id: UserId,
        company_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool>;

    async fn insert_notification(&self, new: NewNotification) -> Result<Notification>;

    async fn pending_notifications(&self, limit: i64) -> Result<Vec<Notification>>;

    async fn mark_notification_sent(&self, id: NotificationId, at: DateTime<Utc>) -> Result<()>;

    async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    async fn count_sent_since(&self, since: DateTime<Utc>) -> Result<i64>;

    async fn count_golden_leads_since(&self, since: DateTime<Utc>) -> Result<i64>;

    // --- scheduled-task ledger ---

    async fn task_run(&self, task: TaskName) -> Result<Option<TaskRun>>;

    async fn record_task_started(&self, task: TaskName, at: DateTime<Utc>) -> Result<()>;

    async fn record_task_finished(
        &self,
        task: TaskName,
        error: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Production [`AlertStore`] backed by Postgres, delegating to the
/// model query methods.
#[derive(Clone)]
pub struct PgAlertStore {
    pool: PgPool,
}

impl PgAlertStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Pairs configs with their owners, preserving config order.
    /// Configs whose owner went missing between the two queries are
    /// dropped.
    async fn attach_users(
        &self,
        configs: Vec<AlertConfig>,
    ) -> Result<Vec<(AlertConfig, User)>> {
        let mut user_ids: Vec<UserId> = configs.iter().map(|c| c.user_id).collect();
        user_ids.sort();
        user_ids.dedup();

        let users = User::find_active_by_ids(&user_ids, &self.pool).await?;
        let by_id: HashMap<UserId, User> = users.into_iter().map(|u| (u.id, u)).collect();

        Ok(configs
            .into_iter()
            .filter_map(|config| {
                let user = by_id.get(&config.user_id)?.clone();
                Some((config, user))
            })
            .collect())
    }
}

#[async_trait]
impl AlertStore for PgAlertStore {
    async fn jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>> {
        Job::find_scraped_since(cutoff, &self.pool).await
    }

    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>> {
        Job::find_by_id(id, &self.pool).await
    }

    async fn count_jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        Job::count_scraped_since(cutoff, &self.pool).await
    }

    async fn hiring_surges_since(
        &self,
        cutoff: DateTime<Utc>,
        min_postings: i64,
    ) -> Result<Vec<HiringSurge>> {
        Job::hiring_surges_since(cutoff, min_postings, &self.pool).await
    }

    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>> {
        Company::find_by_id(id, &self.pool).await
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        User::find_by_id(id, &self.pool).await
    }

    async fn active_configs_for_role(
        &self,
        role: UserRole,
    ) -> Result<Vec<(AlertConfig, User)>> {
        let configs = AlertConfig::find_active_for_role(role, &self.pool).await?;
        self.attach_users(configs).await
    }

    async fn active_configs_with_users(&self) -> Result<Vec<(AlertConfig, User)>> {
        let configs = AlertConfig::find_active(&self.pool).await?;
        self.attach_users(configs).await
    }

    async fn market_signal_recipients(&self) -> Result<Vec<User>> {
        User::find_market_signal_recipients(&self.pool).await
    }

    async fn first_active_config(&self, user_id: UserId) -> Result<Option<AlertConfig>> {
        AlertConfig::find_first_active_for_user(user_id, &self.pool).await
    }

    async fn count_active_users(&self) -> Result<i64> {
        User::count_active(&self.pool).await
    }

    async fn notification_exists(
        &self,
        user_id: UserId,
        job_id: JobId,
        kind: NotificationKind,
    ) -> Result<bool> {
        Notification::exists_for_job(user_id, job_id, kind, &self.pool).await
    }

    async fn market_signal_exists_since(
        &self,
        user_id: UserId,
        company_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Notification::market_signal_exists(user_id, company_name, since, &self.pool).await
    }

    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        Notification::create(new, &self.pool).await
    }

    async fn pending_notifications(&self, limit: i64) -> Result<Vec<Notification>> {
        Notification::find_pending(limit, &self.pool).await
    }

    async fn mark_notification_sent(&self, id: NotificationId, at: DateTime<Utc>) -> Result<()> {
        Notification::mark_sent(id, at, &self.pool).await
    }

    async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        Notification::delete_sent_before(cutoff, &self.pool).await
    }

    async fn count_sent_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Notification::count_sent_since(since, &self.pool).await
    }

    async fn count_golden_leads_since(&self, since: DateTime<Utc>) -> Result<i64> {
        Notification::count_golden_leads_since(since, &self.pool).await
    }

    async fn task_run(&self, task: TaskName) -> Result<Option<TaskRun>> {
        TaskRun::find(task, &self.pool).await
    }

    async fn record_task_started(&self, task: TaskName, at: DateTime<Utc>) -> Result<()> {
        TaskRun::record_started(task, at, &self.pool).await
    }

    async fn record_task_finished(
        &self,
        task: TaskName,
        error: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        TaskRun::record_finished(task, error, at, &self.pool).await
    }
}
