//! Integration tests for the alert pipeline.
//!
//! Runs the alert engine and the dispatch cycle against the in-memory
//! store:
//! - candidate matches flow from detection through email delivery
//! - golden leads require urgency, growth, and salary gates together
//! - hiring surges reach recruiters once per company per day
//! - channel fan-out writes one notification row per channel

use chrono::Utc;
use radar_core::domains::alerts::{
    AlertEngine, NotificationChannel, NotificationKind,
};
use radar_core::domains::delivery::{send_pending_notifications, NotificationDispatcher};
use radar_core::kernel::test_dependencies::fixtures;
use radar_core::kernel::TestDependencies;

// =============================================================================
// Test Helpers
// =============================================================================

fn dispatcher_for(deps: &TestDependencies) -> NotificationDispatcher {
    NotificationDispatcher::new(deps.email.clone(), deps.chat.clone(), None)
}

// =============================================================================
// Candidate matching end to end
// =============================================================================

#[tokio::test]
async fn matching_job_flows_from_detection_to_email_delivery() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.tech_stack = Some(vec!["rust".to_string()]);
    store.seed_user(user.clone());
    store.seed_config(config);

    let mut job = fixtures::job("Senior Rust Engineer", "Ferrous Systems");
    job.stack = Some("Rust, PostgreSQL, AWS".to_string());
    store.seed_job(job.clone());

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.jobs_checked, 1);
    assert_eq!(stats.candidate_alerts, 1);
    assert_eq!(stats.hr_alerts, 0);
    assert_eq!(stats.notifications_created, 1);

    let rows = store.notifications();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, NotificationKind::JobMatch);
    assert_eq!(rows[0].channel, NotificationChannel::Email);
    assert_eq!(rows[0].title, "New opportunity: Senior Rust Engineer");
    assert_eq!(rows[0].job_id, Some(job.id));
    assert!(!rows[0].is_golden_lead);
    assert!(rows[0].urgency_score.is_none());
    assert!(!rows[0].is_sent);

    let dispatcher = dispatcher_for(&deps);
    let summary = send_pending_notifications(store.as_ref(), &dispatcher, 100)
        .await
        .expect("dispatch cycle failed");

    assert_eq!(summary.attempted, 1);
    assert_eq!(summary.sent, 1);
    assert_eq!(summary.failed, 0);

    let sent = deps.email.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "dev@example.com");
    assert_eq!(sent[0].subject, "New opportunity: Senior Rust Engineer");
    assert!(sent[0].html.contains("Ferrous Systems"));

    assert!(store.notifications()[0].is_sent);

    // Re-running the check over the same window creates nothing new.
    let second = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("second alert check failed");
    assert_eq!(second.candidate_alerts, 0);
    assert_eq!(second.notifications_created, 0);
    assert_eq!(store.notification_count(), 1);
}

#[tokio::test]
async fn recruiter_matching_ignores_salary_and_modality_filters() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::recruiter("hr@agency.example");
    let mut config = fixtures::config(&user);
    config.tech_stack = Some(vec!["rust".to_string()]);
    config.salary_min = Some(500_000.0);
    config.modality = Some("remote".to_string());
    store.seed_user(user);
    store.seed_config(config);

    // Salary and modality would both reject this under candidate rules.
    let mut job = fixtures::job("Rust Developer", "Initech");
    job.stack = Some("Rust".to_string());
    job.salary_max = Some(100_000.0);
    store.seed_job(job);

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.hr_alerts, 1);
    assert_eq!(stats.candidate_alerts, 0);

    let rows = store.notifications();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, NotificationKind::HrMatch);
}

// =============================================================================
// Golden leads
// =============================================================================

#[tokio::test]
async fn high_urgency_posting_at_growth_company_becomes_golden_lead() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.golden_leads_only = true;
    store.seed_user(user);
    store.seed_config(config);

    let company = fixtures::company("Rocketship", 0.9);
    store.seed_company(company.clone());

    // Fresh posting, urgency keyword, top-of-market salary: all three
    // urgency bonuses apply and every golden gate clears.
    let mut job = fixtures::job("Staff Platform Engineer", "Rocketship");
    job.company_id = Some(company.id);
    job.posted_at = Some(Utc::now());
    job.raw_description = Some("Urgent hire, interviews this week.".to_string());
    job.salary_max = Some(200_000.0);
    job.stack = Some("Rust, Kubernetes".to_string());
    store.seed_job(job);

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.golden_leads, 1);
    assert_eq!(stats.candidate_alerts, 0);
    assert_eq!(stats.notifications_created, 1);

    let rows = store.notifications();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, NotificationKind::GoldenLead);
    assert!(rows[0].is_golden_lead);
    assert_eq!(rows[0].title, "🌟 GOLDEN LEAD: Staff Platform Engineer");
    let urgency = rows[0].urgency_score.expect("golden lead must carry urgency");
    assert!(urgency > 0.9);
    assert!(rows[0].body.contains("top tier"));
    assert!(rows[0].body.contains("Growth score: 0.90"));
}

#[tokio::test]
async fn missing_salary_bonus_keeps_urgency_below_golden_gate() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.golden_leads_only = true;
    store.seed_user(user);
    store.seed_config(config);

    let company = fixtures::company("Rocketship", 0.9);
    store.seed_company(company.clone());

    // Salary passes the golden floor but misses the urgency bonus, so
    // recency plus keyword stops at the gate instead of over it.
    let mut job = fixtures::job("Staff Platform Engineer", "Rocketship");
    job.company_id = Some(company.id);
    job.posted_at = Some(Utc::now());
    job.raw_description = Some("Urgent hire, interviews this week.".to_string());
    job.salary_max = Some(120_000.0);
    store.seed_job(job);

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.golden_leads, 0);
    assert_eq!(store.notification_count(), 0);
}

#[tokio::test]
async fn golden_leads_only_config_suppresses_ordinary_matches() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.golden_leads_only = true;
    store.seed_user(user);
    store.seed_config(config);

    // Matches the config criteria but is nothing special.
    store.seed_job(fixtures::job("Backend Engineer", "Initech"));

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.candidate_alerts, 0);
    assert_eq!(store.notification_count(), 0);
}

// =============================================================================
// Market signals
// =============================================================================

#[tokio::test]
async fn hiring_surge_alerts_recruiters_once_per_day() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let recruiter = fixtures::recruiter("scout@agency.example");
    let mut config = fixtures::config(&recruiter);
    config.market_signals_enabled = true;
    // A stack filter no posting satisfies keeps HR matches out of the way.
    config.tech_stack = Some(vec!["cobol".to_string()]);
    store.seed_user(recruiter);
    store.seed_config(config);

    store.seed_job(fixtures::job("Backend Engineer", "Initech"));
    store.seed_job(fixtures::job("Frontend Engineer", "Initech"));

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");
    assert_eq!(stats.market_signals, 0, "two postings are below the surge threshold");
    assert_eq!(store.notification_count(), 0);

    store.seed_job(fixtures::job("Data Engineer", "Initech"));

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");
    assert_eq!(stats.market_signals, 1);

    let rows = store.notifications();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].kind, NotificationKind::MarketSignal);
    assert_eq!(rows[0].channel, NotificationChannel::Email);
    assert_eq!(rows[0].job_id, None);
    assert_eq!(rows[0].title, "🚀 Market signal: Initech");
    assert_eq!(rows[0].metadata_str("company_name"), Some("Initech"));
    assert_eq!(rows[0].metadata_i64("job_count"), Some(3));

    // The same surge on the same day stays silent.
    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");
    assert_eq!(stats.market_signals, 0);
    assert_eq!(store.notification_count(), 1);
}

#[tokio::test]
async fn candidates_never_receive_market_signals() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.market_signals_enabled = true;
    config.tech_stack = Some(vec!["cobol".to_string()]);
    store.seed_user(user);
    store.seed_config(config);

    for title in ["Backend Engineer", "Frontend Engineer", "Data Engineer"] {
        store.seed_job(fixtures::job(title, "Initech"));
    }

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.market_signals, 0);
    assert_eq!(store.notification_count(), 0);
}

// =============================================================================
// Channel fan-out
// =============================================================================

#[tokio::test]
async fn configured_channels_fan_out_to_one_row_each() {
    let deps = TestDependencies::new();
    let store = deps.store.clone();

    let user = fixtures::candidate("dev@example.com");
    let mut config = fixtures::config(&user);
    config.channels = vec![NotificationChannel::Email, NotificationChannel::Slack];
    config.slack_webhook_url =
        Some("https://hooks.slack.com/services/T000/B000/XXXX".to_string());
    store.seed_user(user);
    store.seed_config(config);

    store.seed_job(fixtures::job("Platform Engineer", "Globex"));

    let stats = AlertEngine::new(store.clone())
        .run(1)
        .await
        .expect("alert check failed");

    assert_eq!(stats.candidate_alerts, 1);
    assert_eq!(stats.notifications_created, 2);

    let rows = store.notifications();
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|n| n.kind == NotificationKind::JobMatch));
    assert!(rows.iter().any(|n| n.channel == NotificationChannel::Email));
    assert!(rows.iter().any(|n| n.channel == NotificationChannel::Slack));
    assert_eq!(rows[0].title, rows[1].title);
}
