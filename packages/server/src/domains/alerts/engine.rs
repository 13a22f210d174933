//! The alert check: one pass over recently scraped postings that turns
//! matches, golden leads, and hiring surges into queued notifications.
//!
//! Creation is decoupled from delivery. The engine only writes
//! notification rows; the dispatch task drains them later. Duplicate
//! suppression keys job-bound alerts on (user, job, kind) and market
//! signals on (user, company, calendar day), which makes re-running a
//! check over the same window safe.

use anyhow::Result;
use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::common::{format_usd, UserId};
use crate::domains::accounts::{AlertConfig, User, UserRole};
use crate::domains::alerts::matcher;
use crate::domains::alerts::models::{NewNotification, NotificationChannel, NotificationKind};
use crate::domains::alerts::signals::{
    self, MIN_SURGE_POSTINGS, SURGE_WINDOW_HOURS,
};
use crate::domains::alerts::store::AlertStore;
use crate::domains::jobs::{HiringSurge, Job};

/// Counters from one alert check run.
///
/// `candidate_alerts`, `hr_alerts`, and `golden_leads` count detections
/// (a matched user-job pair, or a golden job); `notifications_created`
/// counts the rows actually written, which is larger when configs fan
/// out to several channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertRunStats {
    pub jobs_checked: u64,
    pub candidate_alerts: u64,
    pub hr_alerts: u64,
    pub golden_leads: u64,
    pub market_signals: u64,
    pub notifications_created: u64,
}

/// Runs the four alert passes over one lookback window.
pub struct AlertEngine {
    store: Arc<dyn AlertStore>,
}

impl AlertEngine {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// One full check: candidate matches, recruiter matches, golden
    /// leads, then market signals.
    ///
    /// A failure while creating one notification is logged and skipped;
    /// a failing store read aborts the run. Rows written before an
    /// abort stay put - duplicate suppression makes the next run pick
    /// up where this one stopped.
    pub async fn run(&self, lookback_hours: i64) -> Result<AlertRunStats> {
        let now = Utc::now();
        let cutoff = now - Duration::hours(lookback_hours);

        let jobs = self.store.jobs_scraped_since(cutoff).await?;
        info!(count = jobs.len(), lookback_hours, "checking recently scraped jobs");

        let mut stats = AlertRunStats {
            jobs_checked: jobs.len() as u64,
            ..Default::default()
        };

        let (matches, rows) = self.process_candidate_alerts(&jobs).await?;
        stats.candidate_alerts = matches;
        stats.notifications_created += rows;

        let (matches, rows) = self.process_recruiter_alerts(&jobs).await?;
        stats.hr_alerts = matches;
        stats.notifications_created += rows;

        let (golden, rows) = self.detect_golden_leads(&jobs, now).await?;
        stats.golden_leads = golden;
        stats.notifications_created += rows;

        let (signals, rows) = self.detect_market_signals(now).await?;
        stats.market_signals = signals;
        stats.notifications_created += rows;

        info!(
            jobs_checked = stats.jobs_checked,
            candidate_alerts = stats.candidate_alerts,
            hr_alerts = stats.hr_alerts,
            golden_leads = stats.golden_leads,
            market_signals = stats.market_signals,
            notifications_created = stats.notifications_created,
            "alert check finished"
        );

        Ok(stats)
    }

    /// Candidate pass: full matching rules, one alert per new
    /// (user, job) match, fanned out over the config's channels.
    async fn process_candidate_alerts(&self, jobs: &[Job]) -> Result<(u64, u64)> {
        let configs = self.store.active_configs_for_role(UserRole::Candidate).await?;

        let mut matches = 0;
        let mut rows = 0;
        for (config, user) in &configs {
            if config.golden_leads_only {
                continue;
            }
            for job in jobs {
                if !matcher::job_matches_candidate(job, config) {
                    continue;
                }
                match self
                    .create_match_alert(user, job, config, NotificationKind::JobMatch)
                    .await
                {
                    Ok(Some(created)) => {
                        matches += 1;
                        rows += created;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(
                        user_id = %user.id,
                        job_id = %job.id,
                        "failed to create job match alert: {e:#}"
                    ),
                }
            }
        }

        Ok((matches, rows))
    }

    /// Recruiter pass: same shape as the candidate pass with the
    /// recruiter rule set and its own notification kind.
    async fn process_recruiter_alerts(&self, jobs: &[Job]) -> Result<(u64, u64)> {
        let configs = self.store.active_configs_for_role(UserRole::Recruiter).await?;

        let mut matches = 0;
        let mut rows = 0;
        for (config, user) in &configs {
            if config.golden_leads_only {
                continue;
            }
            for job in jobs {
                if !matcher::job_matches_recruiter(job, config) {
                    continue;
                }
                match self
                    .create_match_alert(user, job, config, NotificationKind::HrMatch)
                    .await
                {
                    Ok(Some(created)) => {
                        matches += 1;
                        rows += created;
                    }
                    Ok(None) => {}
                    Err(e) => warn!(
                        user_id = %user.id,
                        job_id = %job.id,
                        "failed to create hr match alert: {e:#}"
                    ),
                }
            }
        }

        Ok((matches, rows))
    }

    /// Golden-lead pass: score every posting in the window; for each
    /// one clearing the gate, notify every user whose criteria match,
    /// using their first matching config for channel fan-out.
    async fn detect_golden_leads(
        &self,
        jobs: &[Job],
        now: DateTime<Utc>,
    ) -> Result<(u64, u64)> {
        let configs = self.store.active_configs_with_users().await?;

        let mut golden_jobs = 0;
        let mut rows = 0;
        for job in jobs {
            let urgency = signals::urgency_score(job, now);
            let growth = match job.company_id {
                Some(id) => self
                    .store
                    .company_by_id(id)
                    .await?
                    .and_then(|c| c.growth_score),
                None => None,
            };

            if !signals::is_golden_lead(urgency, growth, job.salary_max) {
                continue;
            }

            golden_jobs += 1;
            info!(
                job_id = %job.id,
                company = %job.company_name,
                urgency,
                "golden lead detected"
            );

            // One golden alert per user, from their first matching config.
            let mut notified: HashSet<UserId> = HashSet::new();
            for (config, user) in &configs {
                if notified.contains(&user.id) {
                    continue;
                }
                if !matcher::job_matches_candidate(job, config) {
                    continue;
                }
                notified.insert(user.id);

                match self
                    .create_golden_alert(user, job, config, urgency, growth)
                    .await
                {
                    Ok(Some(created)) => rows += created,
                    Ok(None) => {}
                    Err(e) => warn!(
                        user_id = %user.id,
                        job_id = %job.id,
                        "failed to create golden lead alert: {e:#}"
                    ),
                }
            }
        }

        Ok((golden_jobs, rows))
    }

    /// Market-signal pass: companies with a posting surge in the last
    /// day, announced once per day to each opted-in recruiter. Always a
    /// single email-channel row, never fanned out.
    async fn detect_market_signals(&self, now: DateTime<Utc>) -> Result<(u64, u64)> {
        let window_start = now - Duration::hours(SURGE_WINDOW_HOURS);
        let surges = self
            .store
            .hiring_surges_since(window_start, MIN_SURGE_POSTINGS)
            .await?;
        if surges.is_empty() {
            return Ok((0, 0));
        }

        info!(count = surges.len(), "hiring surges detected");
        let recipients = self.store.market_signal_recipients().await?;
        let day_start = now.date_naive().and_time(NaiveTime::MIN).and_utc();

        let mut signals = 0;
        for surge in &surges {
            for user in &recipients {
                if self
                    .store
                    .market_signal_exists_since(user.id, &surge.company_name, day_start)
                    .await?
                {
                    continue;
                }
                match self
                    .store
                    .insert_notification(market_signal_notification(user.id, surge))
                    .await
                {
                    Ok(_) => signals += 1,
                    Err(e) => warn!(
                        user_id = %user.id,
                        company = %surge.company_name,
                        "failed to create market signal: {e:#}"
                    ),
                }
            }
        }

        Ok((signals, signals))
    }

    /// Creates one alert fanned out to the config's channels, unless a
    /// row for this (user, job, kind) already exists. Returns the number
    /// of rows written, or `None` when suppressed as a duplicate.
    async fn create_match_alert(
        &self,
        user: &User,
        job: &Job,
        config: &AlertConfig,
        kind: NotificationKind,
    ) -> Result<Option<u64>> {
        if self.store.notification_exists(user.id, job.id, kind).await? {
            return Ok(None);
        }

        let (title, body, metadata) = job_alert_content(job, config);
        let mut created = 0;
        for channel in &config.channels {
            self.store
                .insert_notification(NewNotification {
                    user_id: user.id,
                    job_id: Some(job.id),
                    kind,
                    channel: *channel,
                    title: title.clone(),
                    body: body.clone(),
                    is_golden_lead: false,
                    urgency_score: None,
                    metadata: metadata.clone(),
                })
                .await?;
            created += 1;
        }

        Ok(Some(created))
    }

    /// Golden variant of [`Self::create_match_alert`]: flagged rows
    /// carrying the urgency score that drives dispatch ordering.
    async fn create_golden_alert(
        &self,
        user: &User,
        job: &Job,
        config: &AlertConfig,
        urgency: f64,
        growth: Option<f64>,
    ) -> Result<Option<u64>> {
        if self
            .store
            .notification_exists(user.id, job.id, NotificationKind::GoldenLead)
            .await?
        {
            return Ok(None);
        }

        let (title, body, metadata) = golden_lead_content(job, config, urgency, growth);
        let mut created = 0;
        for channel in &config.channels {
            self.store
                .insert_notification(NewNotification {
                    user_id: user.id,
                    job_id: Some(job.id),
                    kind: NotificationKind::GoldenLead,
                    channel: *channel,
                    title: title.clone(),
                    body: body.clone(),
                    is_golden_lead: true,
                    urgency_score: Some(urgency),
                    metadata: metadata.clone(),
                })
                .await?;
            created += 1;
        }

        Ok(Some(created))
    }
}

fn job_alert_content(job: &Job, config: &AlertConfig) -> (String, String, serde_json::Value) {
    let salary = job.salary_summary();
    let salary_text = salary.clone().unwrap_or_else(|| "Not specified".to_string());

    let title = format!("New opportunity: {}", job.title);
    let body = format!(
        "Company: {}\nTech stack: {}\nSalary: {}\nURL: {}",
        job.company_name,
        job.stack_text(),
        salary_text,
        job.source_url
    );
    let metadata = json!({
        "config_name": config.name,
        "tech_stack": job.stack_text(),
        "salary_range": salary.unwrap_or_default(),
    });

    (title, body, metadata)
}

fn golden_lead_content(
    job: &Job,
    config: &AlertConfig,
    urgency: f64,
    growth: Option<f64>,
) -> (String, String, serde_json::Value) {
    let growth_text = growth
        .map(|g| format!("{g:.2}"))
        .unwrap_or_else(|| "N/A".to_string());
    let salary_text = job
        .salary_max
        .map(format_usd)
        .unwrap_or_else(|| "Not specified".to_string());

    let title = format!("🌟 GOLDEN LEAD: {}", job.title);
    let body = format!(
        "⚡ Exceptional opportunity ⚡\n\n\
         Company: {}\n\
         Tech stack: {}\n\
         Salary: {} (top tier)\n\
         Urgency score: {:.2}/1.0\n\
         Growth score: {}\n\n\
         This posting clears every golden-lead gate:\n\
         • High hiring urgency\n\
         • Company on a growth spurt\n\
         • Top-of-market compensation\n\n\
         URL: {}",
        job.company_name,
        job.stack_text(),
        salary_text,
        urgency,
        growth_text,
        job.source_url
    );
    let metadata = json!({
        "config_name": config.name,
        "is_priority": true,
    });

    (title, body, metadata)
}

fn market_signal_notification(user_id: UserId, surge: &HiringSurge) -> NewNotification {
    NewNotification {
        user_id,
        job_id: None,
        kind: NotificationKind::MarketSignal,
        channel: NotificationChannel::Email,
        title: format!("🚀 Market signal: {}", surge.company_name),
        body: format!(
            "{} posted {} openings in the last 24 hours. High hiring velocity detected.",
            surge.company_name, surge.job_count
        ),
        is_golden_lead: false,
        urgency_score: None,
        metadata: json!({
            "company_name": surge.company_name,
            "job_count": surge.job_count,
            "signal_type": "high_hiring_velocity",
        }),
    }
}
