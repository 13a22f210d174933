// TestDependencies - mock implementations for testing
//
// Provides an in-memory store and recording fakes that can be injected
// into ServerDeps for tests.

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use super::{BaseChatWebhook, BaseEmailSender, BaseJobEnricher, BaseJobIngestor, ServerDeps};
use crate::common::{CompanyId, JobId, NotificationId, UserId};
use crate::domains::accounts::{AlertConfig, User, UserRole};
use crate::domains::alerts::{AlertStore, NewNotification, Notification, NotificationKind};
use crate::domains::jobs::{Company, HiringSurge, Job};
use crate::kernel::task_ledger::{TaskName, TaskRun};

// =============================================================================
// In-memory AlertStore
// =============================================================================

/// In-memory [`AlertStore`] with the same query semantics as the
/// Postgres implementation. Seed rows with the `seed_*` methods, run
/// the pipeline, then inspect `notifications()`.
#[derive(Default)]
pub struct MemoryAlertStore {
    jobs: Mutex<Vec<Job>>,
    companies: Mutex<Vec<Company>>,
    users: Mutex<Vec<User>>,
    configs: Mutex<Vec<AlertConfig>>,
    notifications: Mutex<Vec<Notification>>,
    task_runs: Mutex<HashMap<TaskName, TaskRun>>,
}

impl MemoryAlertStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_job(&self, job: Job) {
        self.jobs.lock().unwrap().push(job);
    }

    pub fn seed_company(&self, company: Company) {
        self.companies.lock().unwrap().push(company);
    }

    pub fn seed_user(&self, user: User) {
        self.users.lock().unwrap().push(user);
    }

    pub fn seed_config(&self, config: AlertConfig) {
        self.configs.lock().unwrap().push(config);
    }

    pub fn seed_notification(&self, notification: Notification) {
        self.notifications.lock().unwrap().push(notification);
    }

    pub fn seed_task_run(&self, run: TaskRun) {
        self.task_runs.lock().unwrap().insert(run.task, run);
    }

    /// Snapshot of every notification row, in insertion order.
    pub fn notifications(&self) -> Vec<Notification> {
        self.notifications.lock().unwrap().clone()
    }

    pub fn notification_count(&self) -> usize {
        self.notifications.lock().unwrap().len()
    }

    /// Snapshot of the ledger row for one task.
    pub fn ledger_entry(&self, task: TaskName) -> Option<TaskRun> {
        self.task_runs.lock().unwrap().get(&task).cloned()
    }
}

#[async_trait]
impl AlertStore for MemoryAlertStore {
    async fn jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<Vec<Job>> {
        let mut jobs: Vec<Job> = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.scraped_at >= cutoff && j.is_active)
            .cloned()
            .collect();
        jobs.sort_by_key(|j| j.scraped_at);
        Ok(jobs)
    }

    async fn job_by_id(&self, id: JobId) -> Result<Option<Job>> {
        Ok(self.jobs.lock().unwrap().iter().find(|j| j.id == id).cloned())
    }

    async fn count_jobs_scraped_since(&self, cutoff: DateTime<Utc>) -> Result<i64> {
        let count = self
            .jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.scraped_at >= cutoff)
            .count();
        Ok(count as i64)
    }

    async fn hiring_surges_since(
        &self,
        cutoff: DateTime<Utc>,
        min_postings: i64,
    ) -> Result<Vec<HiringSurge>> {
        let mut counts: HashMap<String, i64> = HashMap::new();
        for job in self.jobs.lock().unwrap().iter() {
            if job.scraped_at >= cutoff && job.is_active {
                *counts.entry(job.company_name.clone()).or_insert(0) += 1;
            }
        }

        let mut surges: Vec<HiringSurge> = counts
            .into_iter()
            .filter(|(_, count)| *count >= min_postings)
            .map(|(company_name, job_count)| HiringSurge {
                company_name,
                job_count,
            })
            .collect();
        surges.sort_by(|a, b| {
            b.job_count
                .cmp(&a.job_count)
                .then_with(|| a.company_name.cmp(&b.company_name))
        });
        Ok(surges)
    }

    async fn company_by_id(&self, id: CompanyId) -> Result<Option<Company>> {
        Ok(self
            .companies
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn user_by_id(&self, id: UserId) -> Result<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn active_configs_for_role(
        &self,
        role: UserRole,
    ) -> Result<Vec<(AlertConfig, User)>> {
        let pairs = self.active_configs_with_users().await?;
        Ok(pairs.into_iter().filter(|(_, u)| u.role == role).collect())
    }

    async fn active_configs_with_users(&self) -> Result<Vec<(AlertConfig, User)>> {
        let users = self.users.lock().unwrap();
        let mut pairs: Vec<(AlertConfig, User)> = self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.is_active)
            .filter_map(|c| {
                let user = users.iter().find(|u| u.id == c.user_id && u.is_active)?;
                Some((c.clone(), user.clone()))
            })
            .collect();
        pairs.sort_by(|a, b| {
            a.0.user_id
                .cmp(&b.0.user_id)
                .then_with(|| a.0.created_at.cmp(&b.0.created_at))
        });
        Ok(pairs)
    }

    async fn market_signal_recipients(&self) -> Result<Vec<User>> {
        let configs = self.configs.lock().unwrap();
        let mut recipients: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.is_active && u.role == UserRole::Recruiter)
            .filter(|u| {
                configs
                    .iter()
                    .any(|c| c.user_id == u.id && c.is_active && c.market_signals_enabled)
            })
            .cloned()
            .collect();
        recipients.sort_by_key(|u| u.id);
        Ok(recipients)
    }

    async fn first_active_config(&self, user_id: UserId) -> Result<Option<AlertConfig>> {
        let mut configs: Vec<AlertConfig> = self
            .configs
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.user_id == user_id && c.is_active)
            .cloned()
            .collect();
        configs.sort_by_key(|c| c.created_at);
        Ok(configs.into_iter().next())
    }

    async fn count_active_users(&self) -> Result<i64> {
        Ok(self.users.lock().unwrap().iter().filter(|u| u.is_active).count() as i64)
    }

    async fn notification_exists(
        &self,
        user_id: UserId,
        job_id: JobId,
        kind: NotificationKind,
    ) -> Result<bool> {
        Ok(self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .any(|n| n.user_id == user_id && n.job_id == Some(job_id) && n.kind == kind))
    }

    async fn market_signal_exists_since(
        &self,
        user_id: UserId,
        company_name: &str,
        since: DateTime<Utc>,
    ) -> Result<bool> {
        Ok(self.notifications.lock().unwrap().iter().any(|n| {
            n.user_id == user_id
                && n.kind == NotificationKind::MarketSignal
                && n.created_at >= since
                && n.metadata_str("company_name") == Some(company_name)
        }))
    }

    async fn insert_notification(&self, new: NewNotification) -> Result<Notification> {
        let notification = Notification {
            id: NotificationId::new(),
            user_id: new.user_id,
            job_id: new.job_id,
            kind: new.kind,
            channel: new.channel,
            title: new.title,
            body: new.body,
            is_golden_lead: new.is_golden_lead,
            urgency_score: new.urgency_score,
            metadata: new.metadata,
            is_sent: false,
            sent_at: None,
            created_at: Utc::now(),
        };
        self.notifications.lock().unwrap().push(notification.clone());
        Ok(notification)
    }

    async fn pending_notifications(&self, limit: i64) -> Result<Vec<Notification>> {
        let mut pending: Vec<Notification> = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| !n.is_sent)
            .cloned()
            .collect();
        // Highest urgency first, unscored rows last, then oldest first.
        pending.sort_by(|a, b| match (a.urgency_score, b.urgency_score) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.created_at.cmp(&b.created_at)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.created_at.cmp(&b.created_at),
        });
        pending.truncate(limit as usize);
        Ok(pending)
    }

    async fn mark_notification_sent(&self, id: NotificationId, at: DateTime<Utc>) -> Result<()> {
        if let Some(n) = self
            .notifications
            .lock()
            .unwrap()
            .iter_mut()
            .find(|n| n.id == id)
        {
            n.is_sent = true;
            n.sent_at = Some(at);
        }
        Ok(())
    }

    async fn delete_sent_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let mut notifications = self.notifications.lock().unwrap();
        let before = notifications.len();
        notifications.retain(|n| !(n.is_sent && n.sent_at.is_some_and(|at| at < cutoff)));
        Ok((before - notifications.len()) as u64)
    }

    async fn count_sent_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_sent && n.sent_at.is_some_and(|at| at >= since))
            .count();
        Ok(count as i64)
    }

    async fn count_golden_leads_since(&self, since: DateTime<Utc>) -> Result<i64> {
        let count = self
            .notifications
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.is_golden_lead && n.created_at >= since)
            .count();
        Ok(count as i64)
    }

    async fn task_run(&self, task: TaskName) -> Result<Option<TaskRun>> {
        Ok(self.task_runs.lock().unwrap().get(&task).cloned())
    }

    async fn record_task_started(&self, task: TaskName, at: DateTime<Utc>) -> Result<()> {
        let mut runs = self.task_runs.lock().unwrap();
        let run = runs.entry(task).or_insert_with(|| TaskRun {
            task,
            last_started_at: None,
            last_succeeded_at: None,
            last_error: None,
            updated_at: at,
        });
        run.last_started_at = Some(at);
        run.updated_at = at;
        Ok(())
    }

    async fn record_task_finished(
        &self,
        task: TaskName,
        error: Option<&str>,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let mut runs = self.task_runs.lock().unwrap();
        let run = runs.entry(task).or_insert_with(|| TaskRun {
            task,
            last_started_at: None,
            last_succeeded_at: None,
            last_error: None,
            updated_at: at,
        });
        if error.is_none() {
            run.last_succeeded_at = Some(at);
        }
        run.last_error = error.map(String::from);
        run.updated_at = at;
        Ok(())
    }
}

// =============================================================================
// Mock Email Sender
// =============================================================================

/// An email captured by [`MockEmailSender`].
#[derive(Debug, Clone)]
pub struct SentEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

pub struct MockEmailSender {
    sent: Arc<Mutex<Vec<SentEmail>>>,
    fail: bool,
}

impl MockEmailSender {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// A sender whose every send fails.
    pub fn failing() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            fail: true,
        }
    }

    /// Get all emails that were sent
    pub fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    /// Check if an email was sent to the given address
    pub fn was_sent_to(&self, email: &str) -> bool {
        self.sent.lock().unwrap().iter().any(|e| e.to == email)
    }

    /// Check if an email with the given subject was sent
    pub fn was_sent_with_subject(&self, subject: &str) -> bool {
        self.sent.lock().unwrap().iter().any(|e| e.subject == subject)
    }
}

impl Default for MockEmailSender {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseEmailSender for MockEmailSender {
    async fn send(&self, to: &str, subject: &str, html: &str) -> Result<()> {
        if self.fail {
            bail!("mock email transport failure");
        }
        self.sent.lock().unwrap().push(SentEmail {
            to: to.to_string(),
            subject: subject.to_string(),
            html: html.to_string(),
        });
        Ok(())
    }
}

// =============================================================================
// Mock Chat Webhook
// =============================================================================

pub struct MockChatWebhook {
    posts: Arc<Mutex<Vec<(String, serde_json::Value)>>>,
    status: Mutex<u16>,
    fail: bool,
}

impl MockChatWebhook {
    pub fn new() -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
            status: Mutex::new(200),
            fail: false,
        }
    }

    /// A webhook whose every post fails at the transport level.
    pub fn failing() -> Self {
        Self {
            posts: Arc::new(Mutex::new(Vec::new())),
            status: Mutex::new(200),
            fail: true,
        }
    }

    /// Respond with the given HTTP status (Slack acks with 200, Discord
    /// with 204).
    pub fn with_status(self, status: u16) -> Self {
        *self.status.lock().unwrap() = status;
        self
    }

    pub fn set_status(&self, status: u16) {
        *self.status.lock().unwrap() = status;
    }

    /// Get all posted payloads with their target URLs
    pub fn posts(&self) -> Vec<(String, serde_json::Value)> {
        self.posts.lock().unwrap().clone()
    }

    pub fn post_count(&self) -> usize {
        self.posts.lock().unwrap().len()
    }

    /// Check if anything was posted to a URL containing the fragment
    pub fn was_posted_to(&self, url_fragment: &str) -> bool {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .any(|(url, _)| url.contains(url_fragment))
    }
}

impl Default for MockChatWebhook {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseChatWebhook for MockChatWebhook {
    async fn post_json(&self, url: &str, payload: &serde_json::Value) -> Result<u16> {
        if self.fail {
            bail!("mock webhook transport failure");
        }
        self.posts
            .lock()
            .unwrap()
            .push((url.to_string(), payload.clone()));
        Ok(*self.status.lock().unwrap())
    }
}

// =============================================================================
// Mock Pipeline Clients
// =============================================================================

pub struct MockJobIngestor {
    runs: AtomicU64,
    jobs_found: i64,
    fail: bool,
    delay_ms: u64,
}

impl MockJobIngestor {
    pub fn new() -> Self {
        Self {
            runs: AtomicU64::new(0),
            jobs_found: 0,
            fail: false,
            delay_ms: 0,
        }
    }

    pub fn with_jobs_found(mut self, jobs_found: i64) -> Self {
        self.jobs_found = jobs_found;
        self
    }

    /// An ingestor whose every run fails.
    pub fn failing() -> Self {
        Self {
            runs: AtomicU64::new(0),
            jobs_found: 0,
            fail: true,
            delay_ms: 0,
        }
    }

    /// Sleep this long inside each run, to let tests overlap runs.
    pub fn with_delay_ms(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Get the number of collection runs
    pub fn collection_runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Default for MockJobIngestor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseJobIngestor for MockJobIngestor {
    async fn run_collection(&self) -> Result<i64> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.delay_ms > 0 {
            tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
        }
        if self.fail {
            bail!("mock ingestion service unavailable");
        }
        Ok(self.jobs_found)
    }
}

pub struct MockJobEnricher {
    runs: AtomicU64,
    jobs_processed: i64,
    fail: bool,
}

impl MockJobEnricher {
    pub fn new() -> Self {
        Self {
            runs: AtomicU64::new(0),
            jobs_processed: 0,
            fail: false,
        }
    }

    pub fn with_jobs_processed(mut self, jobs_processed: i64) -> Self {
        self.jobs_processed = jobs_processed;
        self
    }

    /// An enricher whose every run fails.
    pub fn failing() -> Self {
        Self {
            runs: AtomicU64::new(0),
            jobs_processed: 0,
            fail: true,
        }
    }

    /// Get the number of enrichment runs
    pub fn enrichment_runs(&self) -> u64 {
        self.runs.load(Ordering::SeqCst)
    }
}

impl Default for MockJobEnricher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseJobEnricher for MockJobEnricher {
    async fn enrich_pending(&self) -> Result<i64> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            bail!("mock enrichment service unavailable");
        }
        Ok(self.jobs_processed)
    }
}

// =============================================================================
// Row fixtures
// =============================================================================

/// Builders for fully-populated rows with sensible defaults. Tests
/// override the fields they care about before seeding.
pub mod fixtures {
    use super::*;
    use crate::common::AlertConfigId;
    use crate::domains::accounts::AlertFrequency;
    use crate::domains::alerts::NotificationChannel;

    pub fn candidate(email: &str) -> User {
        User {
            id: UserId::new(),
            email: email.to_string(),
            full_name: None,
            role: UserRole::Candidate,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    pub fn recruiter(email: &str) -> User {
        User {
            role: UserRole::Recruiter,
            ..candidate(email)
        }
    }

    /// An all-pass config for the user: no filters, email channel only.
    pub fn config(user: &User) -> AlertConfig {
        let now = Utc::now();
        AlertConfig {
            id: AlertConfigId::new(),
            user_id: user.id,
            name: "Default alerts".to_string(),
            tech_stack: None,
            keywords: None,
            salary_min: None,
            salary_max: None,
            modality: None,
            channels: vec![NotificationChannel::Email],
            frequency: AlertFrequency::Immediate,
            market_signals_enabled: false,
            golden_leads_only: false,
            slack_webhook_url: None,
            discord_webhook_url: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn job(title: &str, company_name: &str) -> Job {
        let id = JobId::new();
        Job {
            id,
            title: title.to_string(),
            company_id: None,
            company_name: company_name.to_string(),
            raw_description: None,
            stack: None,
            salary_min: None,
            salary_max: None,
            location: None,
            is_remote: false,
            source_url: format!("https://jobs.example.com/postings/{id}"),
            posted_at: None,
            scraped_at: Utc::now(),
            last_verified_at: None,
            is_active: true,
        }
    }

    pub fn company(name: &str, growth_score: f64) -> Company {
        let now = Utc::now();
        Company {
            id: CompanyId::new(),
            name: name.to_string(),
            growth_score: Some(growth_score),
            industry: None,
            created_at: now,
            updated_at: now,
        }
    }
}

// =============================================================================
// TestDependencies - Builder for test dependencies
// =============================================================================

#[derive(Clone)]
pub struct TestDependencies {
    pub store: Arc<MemoryAlertStore>,
    pub email: Arc<MockEmailSender>,
    pub chat: Arc<MockChatWebhook>,
    pub ingestor: Arc<MockJobIngestor>,
    pub enricher: Arc<MockJobEnricher>,
}

impl TestDependencies {
    pub fn new() -> Self {
        Self {
            store: Arc::new(MemoryAlertStore::new()),
            email: Arc::new(MockEmailSender::new()),
            chat: Arc::new(MockChatWebhook::new()),
            ingestor: Arc::new(MockJobIngestor::new()),
            enricher: Arc::new(MockJobEnricher::new()),
        }
    }

    /// Set a mock email sender
    pub fn mock_email(mut self, email: MockEmailSender) -> Self {
        self.email = Arc::new(email);
        self
    }

    /// Set a mock chat webhook
    pub fn mock_chat(mut self, chat: MockChatWebhook) -> Self {
        self.chat = Arc::new(chat);
        self
    }

    /// Set a mock ingestion client
    pub fn mock_ingestor(mut self, ingestor: MockJobIngestor) -> Self {
        self.ingestor = Arc::new(ingestor);
        self
    }

    /// Set a mock enrichment client
    pub fn mock_enricher(mut self, enricher: MockJobEnricher) -> Self {
        self.enricher = Arc::new(enricher);
        self
    }

    /// Build ServerDeps backed by these mocks. The TestDependencies
    /// keeps its own handles so assertions can run afterwards.
    pub fn deps(&self) -> ServerDeps {
        ServerDeps::new(
            self.store.clone(),
            self.email.clone(),
            self.chat.clone(),
            self.ingestor.clone(),
            self.enricher.clone(),
            None,
        )
    }
}

impl Default for TestDependencies {
    fn default() -> Self {
        Self::new()
    }
}
